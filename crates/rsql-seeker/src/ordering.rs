//! Sort nodes, `ORDER BY` generation and the keyset seek predicate.
//!
//! Provides [`Dir`] for sort direction, [`SortNode`] for field-based ordering
//! and [`to_order_by`], which turns a sort list (plus an optional cursor) into
//! an [`OrderByFragment`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeekerError};
use crate::keyset::decode_keyset;
use crate::query::QueryConfig;
use crate::value::ParamList;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Returns `true` if this is ascending order.
    pub fn is_asc(self) -> bool {
        matches!(self, Dir::Asc)
    }

    /// Returns `true` if this is descending order.
    pub fn is_desc(self) -> bool {
        matches!(self, Dir::Desc)
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single sort entry: a logical field and a direction.
///
/// Serializes in the RSQL parser shape, `{"operand": "points", "operator": "desc"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortNode {
    /// The logical field to sort by.
    #[serde(rename = "operand", alias = "field")]
    pub field: String,
    /// The sort direction.
    #[serde(rename = "operator", alias = "dir", default)]
    pub dir: Dir,
}

impl SortNode {
    /// Creates a new ascending sort for the given field.
    pub fn asc(field: impl Into<String>) -> Self {
        SortNode {
            field: field.into(),
            dir: Dir::Asc,
        }
    }

    /// Creates a new descending sort for the given field.
    pub fn desc(field: impl Into<String>) -> Self {
        SortNode {
            field: field.into(),
            dir: Dir::Desc,
        }
    }

    /// Creates a new sort with the given direction.
    pub fn new(field: impl Into<String>, dir: Dir) -> Self {
        SortNode {
            field: field.into(),
            dir,
        }
    }

    /// Parses a comma-separated sort expression such as `-points,lastName`.
    ///
    /// A leading `-` sorts descending, a leading `+` (or nothing) ascending.
    /// Whitespace around entries is ignored, as are empty entries.
    pub fn parse_list(input: &str) -> Vec<SortNode> {
        input
            .split(',')
            .map(str::trim)
            .filter_map(|entry| {
                let (dir, field) = match entry.strip_prefix('-') {
                    Some(rest) => (Dir::Desc, rest),
                    None => (Dir::Asc, entry.strip_prefix('+').unwrap_or(entry)),
                };
                let field = field.trim();
                (!field.is_empty()).then(|| SortNode::new(field, dir))
            })
            .collect()
    }
}

/// The output of [`to_order_by`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderByFragment {
    /// The comma-joined sort list, without the `ORDER BY` keyword.
    pub order_by: String,
    /// The row-value seek predicate, empty without a cursor.
    pub seek: String,
}

impl OrderByFragment {
    /// Returns `true` if neither an ordering nor a seek predicate was produced.
    pub fn is_empty(&self) -> bool {
        self.order_by.is_empty() && self.seek.is_empty()
    }
}

/// Builds the `ORDER BY` list and, given a cursor, the seek predicate.
///
/// Every sort field must be a configured selector that is not marked
/// `sortable: false`; in lax mode unconfigured fields are used as-is. Cursor
/// values are pushed onto `values` in sort order, so their placeholders follow
/// any already bound by the filter.
///
/// The seek comparison is `<` when the first sort is descending and `>`
/// otherwise, applied to the whole row value. Sorts mixing directions
/// therefore only page correctly on their leading column.
pub fn to_order_by(
    sorts: &[SortNode],
    keyset: Option<&str>,
    config: &QueryConfig,
    values: &mut ParamList,
) -> Result<OrderByFragment> {
    let selectors = config.selectors();
    for sort in sorts {
        let sortable = match selectors.get(&sort.field) {
            None => config.is_lax(),
            Some(selector) => selector.sortable() != Some(false),
        };
        if !sortable {
            return Err(SeekerError::InvalidSort(sort.field.clone()));
        }
    }

    let format = config.format();
    let order_by = sorts
        .iter()
        .map(|sort| {
            let column = selectors.resolve(&sort.field);
            match sort.dir {
                Dir::Asc => column.to_string(),
                Dir::Desc => format!("{column} {}", format.keyword("DESC")),
            }
        })
        .collect::<Vec<_>>()
        .join(",");

    let keyset = keyset.filter(|k| !k.trim().is_empty());
    let Some(keyset) = keyset else {
        return Ok(OrderByFragment {
            order_by,
            seek: String::new(),
        });
    };

    let cursor = decode_keyset(keyset)?;
    if cursor.len() != sorts.len() {
        return Err(SeekerError::InvalidKeyset(format!(
            "expected {} values, found {}",
            sorts.len(),
            cursor.len()
        )));
    }
    let Some(first) = sorts.first() else {
        return Ok(OrderByFragment {
            order_by,
            seek: String::new(),
        });
    };

    let columns = sorts
        .iter()
        .map(|sort| selectors.resolve(&sort.field))
        .collect::<Vec<_>>()
        .join(",");
    let placeholders = cursor
        .into_iter()
        .map(|value| values.push(value).to_string())
        .collect::<Vec<_>>()
        .join(",");
    let op = format.symbol(if first.dir.is_desc() { "<" } else { ">" });

    Ok(OrderByFragment {
        order_by,
        seek: format!("({columns}){op}({placeholders})"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyset::encode_keyset;
    use crate::selector::{SelectorConfig, SelectorType};
    use crate::value::Value;

    fn config() -> QueryConfig {
        QueryConfig::new("select * from users u")
            .selector("id", "u.id")
            .selector("firstName", "u.firstName")
            .selector("lastName", "u.lastName")
            .selector(
                "points",
                SelectorConfig::typed("u.pointBalance", SelectorType::Integer),
            )
            .selector(
                "tier",
                SelectorConfig::enumerated("u.tier", ["GOLD", "SILVER"]).with_sortable(false),
            )
    }

    #[test]
    fn dir_display() {
        assert_eq!(Dir::Asc.to_string(), "asc");
        assert_eq!(Dir::Desc.to_string(), "desc");
        assert!(Dir::default().is_asc());
    }

    #[test]
    fn sort_node_constructors() {
        let asc = SortNode::asc("name");
        assert_eq!(asc.field, "name");
        assert_eq!(asc.dir, Dir::Asc);

        let desc = SortNode::desc("priority");
        assert_eq!(desc.field, "priority");
        assert!(desc.dir.is_desc());
    }

    #[test]
    fn parse_list_handles_prefixes_and_whitespace() {
        assert_eq!(
            SortNode::parse_list(" -points, +lastName,firstName,, id "),
            vec![
                SortNode::desc("points"),
                SortNode::asc("lastName"),
                SortNode::asc("firstName"),
                SortNode::asc("id"),
            ]
        );
        assert!(SortNode::parse_list("").is_empty());
        assert!(SortNode::parse_list(" - ").is_empty());
    }

    #[test]
    fn sort_node_serde_shape() {
        let node: SortNode = serde_json::from_str(r#"{"operand":"points","operator":"desc"}"#).unwrap();
        assert_eq!(node, SortNode::desc("points"));
        let node: SortNode = serde_json::from_str(r#"{"operand":"id"}"#).unwrap();
        assert_eq!(node, SortNode::asc("id"));
    }

    #[test]
    fn order_by_without_cursor() {
        let mut values = ParamList::new();
        let sorts = SortNode::parse_list("-points,lastName,firstName,id");
        let fragment = to_order_by(&sorts, None, &config(), &mut values).unwrap();
        assert_eq!(fragment.order_by, "u.pointBalance DESC,u.lastName,u.firstName,u.id");
        assert_eq!(fragment.seek, "");
        assert!(values.is_empty());
    }

    #[test]
    fn order_by_with_cursor() {
        let mut values: ParamList = ["Alice"].into_iter().collect();
        let sorts = SortNode::parse_list("-points,lastName,firstName,id");
        let cursor = encode_keyset(&["2", "Apple", "Alice", "1234-abc"]);
        let fragment = to_order_by(&sorts, Some(&cursor), &config(), &mut values).unwrap();
        assert_eq!(
            fragment.seek,
            "(u.pointBalance,u.lastName,u.firstName,u.id)<($2,$3,$4,$5)"
        );
        assert_eq!(
            values,
            vec![
                Value::from("Alice"),
                Value::from("2"),
                Value::from("Apple"),
                Value::from("Alice"),
                Value::from("1234-abc"),
            ]
        );
    }

    #[test]
    fn ascending_first_sort_seeks_forward_and_formats() {
        let config = config().keywords_lower_case(true).detached_operators(true);
        let mut values = ParamList::new();
        let sorts = SortNode::parse_list("id,-points");
        let cursor = encode_keyset(&["7", "10"]);
        let fragment = to_order_by(&sorts, Some(&cursor), &config, &mut values).unwrap();
        assert_eq!(fragment.order_by, "u.id,u.pointBalance desc");
        assert_eq!(fragment.seek, "(u.id,u.pointBalance) > ($1,$2)");
    }

    #[test]
    fn unknown_and_unsortable_fields_are_rejected() {
        let mut values = ParamList::new();
        let err = to_order_by(&[SortNode::asc("bogus")], None, &config(), &mut values);
        assert_eq!(err.unwrap_err().to_string(), "invalid sort: bogus");
        let err = to_order_by(&[SortNode::asc("tier")], None, &config(), &mut values);
        assert_eq!(err.unwrap_err().to_string(), "invalid sort: tier");
    }

    #[test]
    fn lax_sorts_on_unknown_fields_but_honours_sortable() {
        let config = config().lax(true);
        let mut values = ParamList::new();
        let fragment = to_order_by(&[SortNode::desc("created_at")], None, &config, &mut values).unwrap();
        assert_eq!(fragment.order_by, "created_at DESC");
        assert!(to_order_by(&[SortNode::asc("tier")], None, &config, &mut values).is_err());
    }

    #[test]
    fn cursor_arity_must_match() {
        let mut values = ParamList::new();
        let cursor = encode_keyset(&["1"]);
        let err = to_order_by(&SortNode::parse_list("id,lastName"), Some(&cursor), &config(), &mut values)
            .unwrap_err();
        assert_eq!(err, SeekerError::InvalidKeyset("expected 2 values, found 1".into()));
        assert!(values.is_empty());
    }

    #[test]
    fn empty_sorts_with_empty_cursor() {
        let mut values = ParamList::new();
        let cursor = encode_keyset::<&str>(&[]);
        let fragment = to_order_by(&[], Some(&cursor), &config(), &mut values).unwrap();
        assert!(fragment.is_empty());
        assert!(values.is_empty());
    }

    #[test]
    fn blank_cursor_is_ignored() {
        let mut values = ParamList::new();
        let fragment = to_order_by(&[SortNode::asc("id")], Some(""), &config(), &mut values).unwrap();
        assert_eq!(fragment.seek, "");
    }
}
