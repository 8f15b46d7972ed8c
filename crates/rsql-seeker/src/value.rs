//! Parameter values and the positional parameter list.
//!
//! Every value extracted from a filter or cursor ends up in a [`ParamList`]
//! and is referenced from SQL text through a [`Placeholder`] (`$1`, `$2`, …).
//! The placeholder number is the length of the list right after the push, so
//! numbers are 1-based, strictly increasing, and never reused.

use serde::{Deserialize, Serialize};

/// A value bound to a SQL placeholder.
///
/// Serializes untagged, so a list of values becomes a plain JSON array such as
/// `["Alice", 2, true, ["a", "b"]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(Number),
    /// String value.
    String(String),
    /// List of numbers (for `=in=`/`=out=` on numeric selectors).
    NumberList(Vec<Number>),
    /// List of strings (for `=in=`/`=out=`).
    StringList(Vec<String>),
}

impl Value {
    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns `true` for list values.
    pub fn is_list(&self) -> bool {
        matches!(self, Value::NumberList(_) | Value::StringList(_))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::I64(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(Number::F64(n))
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::StringList(v)
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::StringList(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<Number>> for Value {
    fn from(v: Vec<Number>) -> Self {
        Value::NumberList(v)
    }
}

/// Numeric value.
///
/// Integral input is kept as `I64`; everything else is `F64`. Input that is
/// not a number at all becomes `F64(NaN)`, which serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Returns `true` if the number is NaN.
    pub fn is_nan(self) -> bool {
        matches!(self, Number::F64(n) if n.is_nan())
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::I64(n)
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::I64(n as i64)
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Self {
        Number::F64(n)
    }
}

/// A positional placeholder such as `$3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Placeholder(pub usize);

impl std::fmt::Display for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// The positional parameter list shared by one compilation.
///
/// A list may start non-empty when the base query already binds parameters;
/// placeholders then continue from its current length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamList(Vec<Value>);

impl ParamList {
    /// Creates an empty list.
    pub fn new() -> Self {
        ParamList::default()
    }

    /// Appends a value and returns the placeholder that refers to it.
    pub fn push(&mut self, value: impl Into<Value>) -> Placeholder {
        self.0.push(value.into());
        Placeholder(self.0.len())
    }

    /// Returns the placeholder the next push will produce.
    pub fn next_placeholder(&self) -> Placeholder {
        Placeholder(self.0.len() + 1)
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no value has been pushed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the values in placeholder order.
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    /// Consumes the list, returning the values in placeholder order.
    pub fn into_inner(self) -> Vec<Value> {
        self.0
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }
}

impl From<Vec<Value>> for ParamList {
    fn from(values: Vec<Value>) -> Self {
        ParamList(values)
    }
}

impl<V: Into<Value>> FromIterator<V> for ParamList {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        ParamList(iter.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>> Extend<V> for ParamList {
    fn extend<T: IntoIterator<Item = V>>(&mut self, iter: T) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl PartialEq<Vec<Value>> for ParamList {
    fn eq(&self, other: &Vec<Value>) -> bool {
        &self.0 == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_follow_list_length() {
        let mut params = ParamList::new();
        assert_eq!(params.next_placeholder(), Placeholder(1));
        assert_eq!(params.push("a"), Placeholder(1));
        assert_eq!(params.push(2i64), Placeholder(2));
        assert_eq!(params.next_placeholder().to_string(), "$3");
    }

    #[test]
    fn placeholders_continue_after_existing_values() {
        let mut params: ParamList = ["existing"].into_iter().collect();
        assert_eq!(params.push("x").to_string(), "$2");
    }

    #[test]
    fn serializes_as_plain_json() {
        let params: ParamList = vec![
            Value::from("Alice"),
            Value::from(2i64),
            Value::from(1.5f64),
            Value::from(true),
            Value::from(vec!["a", "b"]),
            Value::from(vec![Number::I64(1), Number::F64(2.5)]),
        ]
        .into();
        assert_eq!(
            serde_json::to_string(&params).unwrap(),
            r#"["Alice",2,1.5,true,["a","b"],[1,2.5]]"#
        );
    }

    #[test]
    fn value_extractors() {
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(3i64).as_number(), Some(Number::I64(3)));
        assert_eq!(Value::from(false).as_bool(), Some(false));
        assert_eq!(Value::from("x").as_bool(), None);
        assert!(Value::from(vec!["a"]).is_list());
        assert!(!Value::from("a").is_list());
    }

    #[test]
    fn number_helpers() {
        assert_eq!(Number::I64(4).to_f64(), 4.0);
        assert!(Number::F64(f64::NAN).is_nan());
        assert!(!Number::I64(0).is_nan());
    }
}
