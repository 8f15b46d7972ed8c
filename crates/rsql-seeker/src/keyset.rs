//! Keyset cursors.
//!
//! A cursor is the URL-safe base64 (no padding) encoding of a JSON array of
//! strings: the values of the sort columns in the last row of the previous
//! page, in sort order. Decoding also accepts padded input and the standard
//! base64 alphabet, since cursors are often round-tripped through other
//! tools.
//!
//! ```
//! use rsql_seeker::{decode_keyset, encode_keyset};
//!
//! let values = vec!["2".to_string(), "Apple".to_string()];
//! let cursor = encode_keyset(&values);
//! assert_eq!(decode_keyset(&cursor)?, values);
//! # Ok::<(), rsql_seeker::SeekerError>(())
//! ```

use std::collections::{BTreeMap, HashMap};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{Result, SeekerError};
use crate::ordering::SortNode;
use crate::selector::Selectors;

/// A result row the next cursor can be taken from.
pub trait KeysetRow {
    /// Returns `true` if the row has the property.
    fn has_column(&self, name: &str) -> bool;

    /// Returns the property rendered as cursor text.
    ///
    /// Strings are returned as-is; any other value is rendered as JSON.
    fn column_text(&self, name: &str) -> Option<String>;
}

impl KeysetRow for serde_json::Map<String, serde_json::Value> {
    fn has_column(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn column_text(&self, name: &str) -> Option<String> {
        self.get(name).map(json_text)
    }
}

impl KeysetRow for serde_json::Value {
    fn has_column(&self, name: &str) -> bool {
        self.as_object().is_some_and(|row| row.contains_key(name))
    }

    fn column_text(&self, name: &str) -> Option<String> {
        self.as_object().and_then(|row| row.column_text(name))
    }
}

impl KeysetRow for HashMap<String, serde_json::Value> {
    fn has_column(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn column_text(&self, name: &str) -> Option<String> {
        self.get(name).map(json_text)
    }
}

impl KeysetRow for HashMap<String, String> {
    fn has_column(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn column_text(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl KeysetRow for BTreeMap<String, String> {
    fn has_column(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn column_text(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

fn json_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Encodes cursor values as URL-safe base64 JSON.
pub fn encode_keyset<S: AsRef<str>>(values: &[S]) -> String {
    let values: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
    // Serializing a list of strings cannot fail.
    let json = serde_json::to_vec(&values).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decodes a cursor into its values.
pub fn decode_keyset(keyset: &str) -> Result<Vec<String>> {
    let normalized: String = keyset
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD
        .decode(normalized)
        .map_err(|e| SeekerError::InvalidKeyset(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| SeekerError::InvalidKeyset(e.to_string()))
}

/// Extracts the cursor values for the next page from the last row returned.
///
/// Each sort field is looked up under its alias (or, for bare selectors, its
/// SQL text) when the row has that property, otherwise under the field name.
/// A row lacking the property fails with the fatal
/// [`SeekerError::MissingRowProperty`].
pub fn last_row_to_keyset<R>(row: &R, sorts: &[SortNode], selectors: &Selectors) -> Result<Vec<String>>
where
    R: KeysetRow + ?Sized,
{
    sorts
        .iter()
        .map(|sort| {
            let property = selectors.row_property(&sort.field, row);
            row.column_text(property)
                .ok_or_else(|| SeekerError::MissingRowProperty(property.to_string()))
        })
        .collect()
}

/// Builds the cursor for the page after `row`.
pub fn next_keyset<R>(row: &R, sorts: &[SortNode], selectors: &Selectors) -> Result<String>
where
    R: KeysetRow + ?Sized,
{
    last_row_to_keyset(row, sorts, selectors).map(|values| encode_keyset(&values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectorConfig;
    use serde_json::json;

    fn selectors() -> Selectors {
        [
            ("id", SelectorConfig::bare("u.id")),
            ("firstName", SelectorConfig::bare("u.firstName")),
            ("points", SelectorConfig::bare("u.pointBalance").with_alias("points")),
            ("lastName", SelectorConfig::bare("u.lastName").with_alias("last_name")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn encodes_url_safe_without_padding() {
        let cursor = encode_keyset(&["2", "Apple", "Alice", "1234-abc"]);
        assert!(!cursor.contains('='));
        assert!(!cursor.contains('+'));
        assert!(!cursor.contains('/'));
        assert_eq!(
            decode_keyset(&cursor).unwrap(),
            vec!["2", "Apple", "Alice", "1234-abc"]
        );
    }

    #[test]
    fn decodes_padded_and_standard_alphabet() {
        use base64::engine::general_purpose::STANDARD;

        let json = r#"["??>","a"]"#;
        let standard = STANDARD.encode(json);
        assert!(standard.contains('/') || standard.contains('+') || standard.ends_with('='));
        assert_eq!(decode_keyset(&standard).unwrap(), vec!["??>", "a"]);
    }

    #[test]
    fn empty_list_round_trips() {
        let cursor = encode_keyset::<&str>(&[]);
        assert_eq!(decode_keyset(&cursor).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            decode_keyset("not base64!"),
            Err(SeekerError::InvalidKeyset(_))
        ));
        let not_a_list = URL_SAFE_NO_PAD.encode(r#"{"a":1}"#);
        assert!(matches!(
            decode_keyset(&not_a_list),
            Err(SeekerError::InvalidKeyset(_))
        ));
    }

    #[test]
    fn extracts_values_by_alias_sql_or_field() {
        let row = json!({
            "points": 2,
            "last_name": "Apple",
            "u.firstName": "Alice",
            "id": "1234-abc",
        });
        let sorts = SortNode::parse_list("-points,lastName,firstName,id");
        assert_eq!(
            last_row_to_keyset(&row, &sorts, &selectors()).unwrap(),
            vec!["2", "Apple", "Alice", "1234-abc"]
        );
    }

    #[test]
    fn non_string_values_are_json() {
        let row = json!({ "id": null, "points": 1.5, "active": true });
        let sorts = SortNode::parse_list("id,points,active");
        assert_eq!(
            last_row_to_keyset(&row, &sorts, &Selectors::new()).unwrap(),
            vec!["null", "1.5", "true"]
        );
    }

    #[test]
    fn missing_property_is_fatal() {
        let row: HashMap<String, String> = [("id".to_string(), "7".to_string())].into();
        let sorts = SortNode::parse_list("lastName");
        let err = last_row_to_keyset(&row, &sorts, &selectors()).unwrap_err();
        assert_eq!(err, SeekerError::MissingRowProperty("lastName".into()));
        assert!(err.is_fatal());
    }

    #[test]
    fn next_keyset_encodes_row() {
        let row: BTreeMap<String, String> = [("id".to_string(), "7".to_string())].into();
        let cursor = next_keyset(&row, &SortNode::parse_list("id"), &Selectors::new()).unwrap();
        assert_eq!(decode_keyset(&cursor).unwrap(), vec!["7"]);
    }
}
