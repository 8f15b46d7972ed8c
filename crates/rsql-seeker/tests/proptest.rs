//! Property-based tests for rsql-seeker using proptest.

use proptest::prelude::*;
use rsql_seeker::{
    decode_keyset, encode_keyset, operator_to_sql, is_known_operator, to_order_by, to_sql, Node,
    ParamList, QueryConfig, SortNode, SqlFormat, Value,
};

// ============================================================================
// Test helpers
// ============================================================================

fn lax_config() -> QueryConfig {
    QueryConfig::new("select * from t").lax(true)
}

const OPERATORS: &[&str] = &["==", "!=", "<", "<=", ">", ">=", "=lt=", "=ge=", "=in=", "=out="];

// Strategy for comparisons over lax selectors with non-empty operands
fn comparison_strategy() -> impl Strategy<Value = Node> {
    (
        "[a-z]{1,8}",
        prop::sample::select(OPERATORS),
        prop::collection::vec("[A-Za-z0-9*]{1,6}", 1..4),
    )
        .prop_map(|(selector, op, operands)| Node::comparison(selector, op, operands))
}

// Strategy for filter trees up to a few levels deep
fn node_strategy() -> impl Strategy<Value = Node> {
    comparison_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Node::and),
            prop::collection::vec(inner.clone(), 1..4).prop_map(Node::or),
            inner.prop_map(Node::not),
        ]
    })
}

fn count_comparisons(node: &Node) -> usize {
    match node {
        Node::Comparison(_) => 1,
        Node::Group(group) => group
            .operands
            .iter()
            .filter_map(|operand| operand.as_node())
            .map(count_comparisons)
            .sum(),
    }
}

fn placeholders(sql: &str) -> Vec<usize> {
    let mut found = Vec::new();
    let mut rest = sql;
    while let Some(pos) = rest.find('$') {
        rest = &rest[pos + 1..];
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        if let Ok(n) = digits.parse() {
            found.push(n);
        }
    }
    found
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Decoding an encoded cursor returns the original values.
    #[test]
    fn keyset_round_trips(values in prop::collection::vec(".*", 0..6)) {
        let cursor = encode_keyset(&values);
        prop_assert!(!cursor.contains('='));
        prop_assert_eq!(decode_keyset(&cursor).unwrap(), values);
    }

    /// Every comparison binds exactly one value, numbered in order of appearance.
    #[test]
    fn placeholders_are_sequential(node in node_strategy(), preset in 0usize..3) {
        let mut values: ParamList = (0..preset).map(|i| Value::from(i as i64)).collect();
        let sql = to_sql(Some(&node), &lax_config(), &mut values).unwrap();

        let expected: Vec<usize> = (preset + 1..=preset + count_comparisons(&node)).collect();
        prop_assert_eq!(placeholders(&sql), expected);
        prop_assert_eq!(values.len(), preset + count_comparisons(&node));
    }

    /// Compiling the same tree twice yields the same SQL and values.
    #[test]
    fn compilation_is_deterministic(node in node_strategy()) {
        let config = lax_config();
        let mut first = ParamList::new();
        let mut second = ParamList::new();
        let a = to_sql(Some(&node), &config, &mut first).unwrap();
        let b = to_sql(Some(&node), &config, &mut second).unwrap();
        prop_assert_eq!(a, b);
        prop_assert_eq!(first, second);
    }

    /// A filter that fails validation leaves the value list untouched.
    #[test]
    fn failures_leave_values_alone(node in node_strategy(), preset in 0usize..3) {
        let config = QueryConfig::new("select * from t");
        let mut values: ParamList = (0..preset).map(|i| Value::from(i as i64)).collect();
        let before = values.clone();
        prop_assert!(to_sql(Some(&node), &config, &mut values).is_err());
        prop_assert_eq!(values, before);
    }

    /// Cursor values follow the filter values and match the sort arity.
    #[test]
    fn seek_placeholders_follow_existing_values(
        fields in prop::collection::vec("[a-z]{1,6}", 1..5),
        desc in any::<bool>(),
        preset in 0usize..4,
    ) {
        let sorts: Vec<SortNode> = fields
            .iter()
            .map(|f| if desc { SortNode::desc(f.as_str()) } else { SortNode::asc(f.as_str()) })
            .collect();
        let cursor_values: Vec<String> = (0..sorts.len()).map(|i| format!("v{i}")).collect();
        let cursor = encode_keyset(&cursor_values);

        let mut values: ParamList = (0..preset).map(|i| Value::from(i as i64)).collect();
        let fragment = to_order_by(&sorts, Some(&cursor), &lax_config(), &mut values).unwrap();

        let expected: Vec<usize> = (preset + 1..=preset + sorts.len()).collect();
        prop_assert_eq!(placeholders(&fragment.seek), expected);
        prop_assert_eq!(values.len(), preset + sorts.len());
        let op = if desc { ")<(" } else { ")>(" };
        prop_assert!(fragment.seek.contains(op));
    }

    /// Known-operator checks agree with operator translation.
    #[test]
    fn known_operator_matches_translation(token in "[=!<>a-zA-Z]{0,6}") {
        prop_assert_eq!(
            is_known_operator(&token),
            operator_to_sql(&token, SqlFormat::default()).is_ok()
        );
    }
}
