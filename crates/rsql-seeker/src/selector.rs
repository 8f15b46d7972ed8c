//! Selector configuration and resolution.
//!
//! A selector maps a client-facing field name to the SQL expression that is
//! written into the query. Configuration comes in three shapes, mirroring the
//! JSON accepted by [`QueryConfig`](crate::QueryConfig):
//!
//! ```json
//! {
//!   "id": "u.id",
//!   "active": { "sql": "u.active", "type": "boolean" },
//!   "tier": { "sql": "u.tier", "enum": ["GOLD", "SILVER", "BRONZE"], "sortable": true }
//! }
//! ```
//!
//! Selector names are only ever used as keys; the SQL text always comes from
//! the configuration, or from the field name itself when no entry exists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::keyset::KeysetRow;

/// Declared value type of a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectorType {
    String,
    Number,
    Integer,
    Date,
    DateTime,
    Boolean,
}

impl SelectorType {
    /// Returns the configuration name of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            SelectorType::String => "string",
            SelectorType::Number => "number",
            SelectorType::Integer => "integer",
            SelectorType::Date => "date",
            SelectorType::DateTime => "date-time",
            SelectorType::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for SelectorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration of a single selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorConfig {
    /// Plain SQL expression, e.g. `"u.firstName"`.
    Bare(String),
    /// Expression restricted to a fixed set of values.
    ///
    /// Membership is the only validation; there is no separate type check.
    Enumerated {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sql: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
        #[serde(rename = "enum")]
        values: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sortable: Option<bool>,
    },
    /// Expression with an optional declared type.
    Typed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sql: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<SelectorType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sortable: Option<bool>,
    },
}

impl SelectorConfig {
    /// Creates a bare SQL expression selector.
    pub fn bare(sql: impl Into<String>) -> Self {
        SelectorConfig::Bare(sql.into())
    }

    /// Creates a typed selector.
    pub fn typed(sql: impl Into<String>, kind: SelectorType) -> Self {
        SelectorConfig::Typed {
            sql: Some(sql.into()),
            alias: None,
            kind: Some(kind),
            sortable: None,
        }
    }

    /// Creates an enumerated selector.
    pub fn enumerated<I, S>(sql: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SelectorConfig::Enumerated {
            sql: Some(sql.into()),
            alias: None,
            values: values.into_iter().map(Into::into).collect(),
            sortable: None,
        }
    }

    /// Sets the row alias used when building a cursor from a result row.
    ///
    /// A bare selector is promoted to an untyped record.
    pub fn with_alias(self, alias: impl Into<String>) -> Self {
        let alias = Some(alias.into());
        match self {
            SelectorConfig::Bare(sql) => SelectorConfig::Typed {
                sql: Some(sql),
                alias,
                kind: None,
                sortable: None,
            },
            SelectorConfig::Enumerated {
                sql,
                values,
                sortable,
                ..
            } => SelectorConfig::Enumerated {
                sql,
                alias,
                values,
                sortable,
            },
            SelectorConfig::Typed {
                sql,
                kind,
                sortable,
                ..
            } => SelectorConfig::Typed {
                sql,
                alias,
                kind,
                sortable,
            },
        }
    }

    /// Sets the sortable flag. A bare selector is promoted to an untyped record.
    pub fn with_sortable(self, flag: bool) -> Self {
        let flag = Some(flag);
        match self {
            SelectorConfig::Bare(sql) => SelectorConfig::Typed {
                sql: Some(sql),
                alias: None,
                kind: None,
                sortable: flag,
            },
            SelectorConfig::Enumerated {
                sql, alias, values, ..
            } => SelectorConfig::Enumerated {
                sql,
                alias,
                values,
                sortable: flag,
            },
            SelectorConfig::Typed {
                sql, alias, kind, ..
            } => SelectorConfig::Typed {
                sql,
                alias,
                kind,
                sortable: flag,
            },
        }
    }

    /// Returns the configured SQL expression, if any.
    pub fn sql(&self) -> Option<&str> {
        match self {
            SelectorConfig::Bare(sql) => Some(sql),
            SelectorConfig::Enumerated { sql, .. } | SelectorConfig::Typed { sql, .. } => {
                sql.as_deref()
            }
        }
    }

    /// Returns the row alias, if any.
    pub fn alias(&self) -> Option<&str> {
        match self {
            SelectorConfig::Bare(_) => None,
            SelectorConfig::Enumerated { alias, .. } | SelectorConfig::Typed { alias, .. } => {
                alias.as_deref()
            }
        }
    }

    /// Returns the explicit sortable flag, if any.
    pub fn sortable(&self) -> Option<bool> {
        match self {
            SelectorConfig::Bare(_) => None,
            SelectorConfig::Enumerated { sortable, .. } | SelectorConfig::Typed { sortable, .. } => {
                *sortable
            }
        }
    }

    /// Returns the declared type of a typed selector.
    pub fn kind(&self) -> Option<SelectorType> {
        match self {
            SelectorConfig::Typed { kind, .. } => *kind,
            _ => None,
        }
    }

    /// Returns the allowed values of an enumerated selector.
    pub fn allowed_values(&self) -> Option<&[String]> {
        match self {
            SelectorConfig::Enumerated { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Returns `true` for the record forms, which carry value validation rules.
    pub fn is_record(&self) -> bool {
        !matches!(self, SelectorConfig::Bare(_))
    }
}

impl From<&str> for SelectorConfig {
    fn from(sql: &str) -> Self {
        SelectorConfig::Bare(sql.to_string())
    }
}

impl From<String> for SelectorConfig {
    fn from(sql: String) -> Self {
        SelectorConfig::Bare(sql)
    }
}

/// Map from field name to selector configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selectors(BTreeMap<String, SelectorConfig>);

impl Selectors {
    /// Creates an empty selector map.
    pub fn new() -> Self {
        Selectors::default()
    }

    /// Adds or replaces a selector.
    pub fn insert(&mut self, field: impl Into<String>, config: impl Into<SelectorConfig>) {
        self.0.insert(field.into(), config.into());
    }

    /// Returns the configuration for a field.
    pub fn get(&self, field: &str) -> Option<&SelectorConfig> {
        self.0.get(field)
    }

    /// Returns `true` if the field is configured.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns the number of configured selectors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no selector is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the SQL expression to write in place of `field`.
    ///
    /// Falls back to the field name itself when the field is not configured
    /// or its record omits `sql`.
    pub fn resolve<'a>(&'a self, field: &'a str) -> &'a str {
        self.get(field).and_then(SelectorConfig::sql).unwrap_or(field)
    }

    /// Returns the record configuration of a field, skipping bare selectors.
    pub fn record(&self, field: &str) -> Option<&SelectorConfig> {
        self.get(field).filter(|config| config.is_record())
    }

    /// Returns the row property under which the field's value is found.
    ///
    /// Prefers the alias (records) or the SQL text (bare selectors) when the
    /// row has such a property, otherwise the field name. Whether the returned
    /// property exists is left to the caller to check.
    pub fn row_property<'a, R>(&'a self, field: &'a str, row: &R) -> &'a str
    where
        R: KeysetRow + ?Sized,
    {
        let candidate = match self.get(field) {
            None => None,
            Some(SelectorConfig::Bare(sql)) => Some(sql.as_str()),
            Some(config) => config.alias(),
        };
        candidate
            .filter(|property| row.has_column(property))
            .unwrap_or(field)
    }
}

impl<K, V> FromIterator<(K, V)> for Selectors
where
    K: Into<String>,
    V: Into<SelectorConfig>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Selectors(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
