//! Operand validation and coercion.
//!
//! Operands arrive as raw strings. Before a comparison is compiled,
//! [`is_value_valid`] checks the first operand against the selector's declared
//! type or enum; while compiling, [`coerce_value`] turns the operand(s) into
//! the [`Value`] that is bound to the placeholder.
//!
//! Numeric parsing follows the usual string-to-number rules of web clients:
//! surrounding whitespace is ignored, `0x`/`0o`/`0b` prefixes and exponents
//! are accepted, and `Infinity` is a number.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::Comparison;
use crate::selector::{SelectorConfig, SelectorType, Selectors};
use crate::value::{Number, Value};

static BOOLEAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(true|false)$").unwrap());

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

static ISO_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?<year>\d{4})-(?<month>0[1-9]|1[0-2])-(?<day>0[1-9]|1\d|2\d|3[0-1])").unwrap()
});

static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").unwrap());

static SIGNED_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").unwrap());

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Returns `true` if `value` is acceptable for the selector.
///
/// Bare selectors accept anything. Enumerated selectors accept exact members
/// only; typed selectors check the value's shape.
pub fn is_value_valid(config: &SelectorConfig, value: &str) -> bool {
    if let Some(allowed) = config.allowed_values() {
        return allowed.iter().any(|member| member == value);
    }
    let Some(kind) = config.kind() else {
        return true;
    };
    match kind {
        SelectorType::Boolean => BOOLEAN.is_match(value),
        SelectorType::Date => ISO_DATE.is_match(value) && parses_as_iso8601(value),
        SelectorType::DateTime => parses_as_iso8601(value),
        SelectorType::Integer => INTEGER.is_match(value) && !parse_number(value).is_nan(),
        SelectorType::Number => !parse_number(value).is_nan(),
        SelectorType::String => true,
    }
}

/// Converts a comparison's operand(s) into the value bound to SQL.
///
/// With `allow_array` (`=in=`/`=out=`) every operand is converted and a list
/// is returned; otherwise only the first operand is used.
pub fn coerce_value(node: &Comparison, selectors: &Selectors, allow_array: bool) -> Value {
    let first = node.first_operand();
    let Some(config) = selectors.record(&node.selector) else {
        return raw(node, allow_array);
    };

    if let Some(allowed) = config.allowed_values() {
        let is_member = |operand: &str| allowed.iter().any(|member| member == operand);
        if allow_array {
            return Value::StringList(
                node.operands
                    .iter()
                    .filter(|operand| is_member(operand))
                    .cloned()
                    .collect(),
            );
        }
        return Value::String(if is_member(first) { first } else { "" }.to_string());
    }

    let Some(kind) = config.kind() else {
        return raw(node, allow_array);
    };
    match kind {
        SelectorType::String | SelectorType::Date | SelectorType::DateTime => {
            raw(node, allow_array)
        }
        SelectorType::Integer | SelectorType::Number => {
            if allow_array {
                Value::NumberList(node.operands.iter().map(|o| parse_number(o)).collect())
            } else {
                Value::Number(parse_number(first))
            }
        }
        SelectorType::Boolean => Value::Bool(first.eq_ignore_ascii_case("true")),
    }
}

fn raw(node: &Comparison, allow_array: bool) -> Value {
    if allow_array {
        Value::StringList(node.operands.clone())
    } else {
        Value::String(node.first_operand().to_string())
    }
}

/// Parses a string into a number; unparsable input yields `NaN`.
pub fn parse_number(input: &str) -> Number {
    let s = input.trim();
    if s.is_empty() {
        return Number::I64(0);
    }
    if SIGNED_INTEGER.is_match(s) {
        if let Ok(n) = s.parse::<i64>() {
            return Number::I64(n);
        }
    }
    if DECIMAL.is_match(s) {
        return Number::F64(s.parse::<f64>().unwrap_or(f64::NAN));
    }
    match s {
        "Infinity" | "+Infinity" => return Number::F64(f64::INFINITY),
        "-Infinity" => return Number::F64(f64::NEG_INFINITY),
        _ => {}
    }
    let radix = match s.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0o" | "0O") => 8,
        Some("0b" | "0B") => 2,
        _ => return Number::F64(f64::NAN),
    };
    match i64::from_str_radix(&s[2..], radix) {
        Ok(n) if !s[2..].starts_with(['+', '-']) => Number::I64(n),
        _ => Number::F64(f64::NAN),
    }
}

/// Returns `true` if the input parses as an ISO-8601 date or date-time.
///
/// Accepts `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, and date-times with `T` or space,
/// with or without seconds, fractions and a UTC offset.
pub fn parses_as_iso8601(input: &str) -> bool {
    if DateTime::parse_from_rfc3339(input).is_ok()
        || DateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f%z").is_ok()
        || DateTime::parse_from_str(input, "%Y-%m-%dT%H:%M%z").is_ok()
    {
        return true;
    }
    let naive = input.strip_suffix('Z').unwrap_or(input);
    if NAIVE_DATE_TIME_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(naive, format).is_ok())
    {
        return true;
    }
    let bytes = input.as_bytes();
    let date = match bytes.len() {
        4 if bytes.iter().all(u8::is_ascii_digit) => format!("{input}-01-01"),
        7 if bytes[4] == b'-' => format!("{input}-01"),
        _ => input.to_string(),
    };
    date.len() == 10 && NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(kind: SelectorType) -> SelectorConfig {
        SelectorConfig::typed("col", kind)
    }

    fn selectors() -> Selectors {
        [
            ("name", SelectorConfig::bare("u.name")),
            ("label", typed(SelectorType::String)),
            ("points", typed(SelectorType::Integer)),
            ("ratio", typed(SelectorType::Number)),
            ("active", typed(SelectorType::Boolean)),
            ("dob", typed(SelectorType::Date)),
            (
                "tier",
                SelectorConfig::enumerated("u.tier", ["GOLD", "SILVER", "BRONZE"]),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn enum_membership() {
        let tier = SelectorConfig::enumerated("u.tier", ["GOLD", "SILVER", "BRONZE"]);
        assert!(is_value_valid(&tier, "GOLD"));
        assert!(is_value_valid(&tier, "BRONZE"));
        assert!(!is_value_valid(&tier, "DIAMOND"));
        assert!(!is_value_valid(&tier, "gold"));
    }

    #[test]
    fn boolean_validation() {
        let config = typed(SelectorType::Boolean);
        assert!(is_value_valid(&config, "true"));
        assert!(is_value_valid(&config, "FALSE"));
        assert!(!is_value_valid(&config, "yes"));
        assert!(!is_value_valid(&config, "true "));
    }

    #[test]
    fn integer_validation() {
        let config = typed(SelectorType::Integer);
        assert!(is_value_valid(&config, "42"));
        assert!(is_value_valid(&config, "007"));
        assert!(!is_value_valid(&config, "-1"));
        assert!(!is_value_valid(&config, "1.5"));
        assert!(!is_value_valid(&config, "abc"));
    }

    #[test]
    fn number_validation() {
        let config = typed(SelectorType::Number);
        for ok in ["1", "-1.5", "1e3", " 12 ", "0x1F", ".5", "Infinity"] {
            assert!(is_value_valid(&config, ok), "{ok}");
        }
        for bad in ["abc", "1.2.3", "12px", "0xZZ", "inf", "NaN"] {
            assert!(!is_value_valid(&config, bad), "{bad}");
        }
    }

    #[test]
    fn date_validation() {
        let config = typed(SelectorType::Date);
        assert!(is_value_valid(&config, "2000-01-31"));
        assert!(is_value_valid(&config, "2000-01-31T10:00:00Z"));
        assert!(!is_value_valid(&config, "2000-13-01"));
        assert!(!is_value_valid(&config, "2001-02-30"));
        assert!(!is_value_valid(&config, "2000"));
        assert!(!is_value_valid(&config, "01/31/2000"));
    }

    #[test]
    fn date_time_validation() {
        let config = typed(SelectorType::DateTime);
        for ok in [
            "2020-05-01T12:30:00Z",
            "2020-05-01T12:30:00.123+02:00",
            "2020-05-01T12:30:00",
            "2020-05-01T12:30",
            "2020-05-01 12:30:00",
            "2020-05-01",
            "2020-05",
            "2020",
        ] {
            assert!(is_value_valid(&config, ok), "{ok}");
        }
        for bad in ["yesterday", "2020-05-01T25:00:00", "2020-02-30", ""] {
            assert!(!is_value_valid(&config, bad), "{bad}");
        }
    }

    #[test]
    fn string_and_untyped_accept_anything() {
        assert!(is_value_valid(&typed(SelectorType::String), "anything at all"));
        assert!(is_value_valid(&SelectorConfig::bare("x"), "anything"));
        let untyped = SelectorConfig::bare("x").with_sortable(true);
        assert!(is_value_valid(&untyped, "anything"));
    }

    #[test]
    fn coerce_without_config_passes_raw() {
        let s = selectors();
        let node = Comparison::new("name", "==", ["Alice"]);
        assert_eq!(coerce_value(&node, &s, false), Value::from("Alice"));
        let node = Comparison::new("unknown", "=in=", ["a", "b"]);
        assert_eq!(coerce_value(&node, &s, true), Value::from(vec!["a", "b"]));
    }

    #[test]
    fn coerce_numbers() {
        let s = selectors();
        let node = Comparison::new("points", "=gt=", ["10"]);
        assert_eq!(coerce_value(&node, &s, false), Value::Number(Number::I64(10)));
        let node = Comparison::new("ratio", "<", ["2.5"]);
        assert_eq!(coerce_value(&node, &s, false), Value::Number(Number::F64(2.5)));
        let node = Comparison::new("points", "=in=", ["1", "2"]);
        assert_eq!(
            coerce_value(&node, &s, true),
            Value::NumberList(vec![Number::I64(1), Number::I64(2)])
        );
    }

    #[test]
    fn coerce_boolean() {
        let s = selectors();
        let node = Comparison::new("active", "==", ["TRUE"]);
        assert_eq!(coerce_value(&node, &s, false), Value::Bool(true));
        let node = Comparison::new("active", "==", ["false"]);
        assert_eq!(coerce_value(&node, &s, false), Value::Bool(false));
    }

    #[test]
    fn coerce_strings_and_dates_unchanged() {
        let s = selectors();
        let node = Comparison::new("dob", ">=", ["2000-01-01"]);
        assert_eq!(coerce_value(&node, &s, false), Value::from("2000-01-01"));
        let node = Comparison::new("label", "=out=", ["x", "y"]);
        assert_eq!(coerce_value(&node, &s, true), Value::from(vec!["x", "y"]));
    }

    #[test]
    fn coerce_enum() {
        let s = selectors();
        let node = Comparison::new("tier", "==", ["GOLD"]);
        assert_eq!(coerce_value(&node, &s, false), Value::from("GOLD"));
        let node = Comparison::new("tier", "==", ["DIAMOND"]);
        assert_eq!(coerce_value(&node, &s, false), Value::from(""));
        let node = Comparison::new("tier", "=in=", ["GOLD", "DIAMOND", "BRONZE"]);
        assert_eq!(
            coerce_value(&node, &s, true),
            Value::from(vec!["GOLD", "BRONZE"])
        );
    }

    #[test]
    fn parse_number_rules() {
        assert_eq!(parse_number("42"), Number::I64(42));
        assert_eq!(parse_number(" -7 "), Number::I64(-7));
        assert_eq!(parse_number(""), Number::I64(0));
        assert_eq!(parse_number("1e2"), Number::F64(100.0));
        assert_eq!(parse_number("0x10"), Number::I64(16));
        assert_eq!(parse_number("0b101"), Number::I64(5));
        assert_eq!(parse_number("-Infinity"), Number::F64(f64::NEG_INFINITY));
        assert!(parse_number("twelve").is_nan());
        assert!(parse_number("0x-1").is_nan());
        assert!(parse_number("99999999999999999999").to_f64() > 9.9e19);
    }
}
