//! Filter tree to SQL predicate compilation.
//!
//! [`to_sql`] validates a tree and renders it as a parameterized predicate,
//! pushing one value onto the shared [`ParamList`] per comparison (plugins
//! decide for themselves).
//!
//! | Node | SQL |
//! |------|-----|
//! | `and`/`or` | `(a AND b AND c)` |
//! | `not` | `NOT(a)` |
//! | `name==Alice` | `name=$1` |
//! | `name==*ice`, `name!=Al*` | `name ILIKE $1`, `name NOT ILIKE $1` |
//! | `year=gt=2000` | `year>$1` |
//! | `genre=in=(a,b)` | `genre IN $1` (one list value) |
//!
//! Wildcards are only recognized at either end of an `==`/`!=` operand and
//! are rewritten to `%`; the pattern is bound as a string, uncoerced.

use crate::ast::{Comparison, Connective, Group, Node};
use crate::coerce::coerce_value;
use crate::error::{Result, SeekerError};
use crate::op::{Operator, SqlFormat};
use crate::plugin::maybe_execute_plugin;
use crate::query::QueryConfig;
use crate::validate::{operand_node, validate};
use crate::value::ParamList;

/// Compiles a filter tree into a SQL predicate.
///
/// `None` compiles to an empty string. Placeholders continue from the current
/// length of `values`. On error, `values` is restored to its length on entry.
///
/// ```
/// use rsql_seeker::{to_sql, Node, ParamList, QueryConfig, Value};
///
/// let config = QueryConfig::new("select * from films").lax(true);
/// let filter = Node::and([
///     Node::comparison("name", "==", ["Kill Bill"]),
///     Node::not(Node::comparison("year", "=gt=", ["2003"])),
/// ]);
/// let mut values = ParamList::new();
/// assert_eq!(
///     to_sql(Some(&filter), &config, &mut values)?,
///     "(name=$1 AND NOT(year>$2))"
/// );
/// assert_eq!(values, vec![Value::from("Kill Bill"), Value::from("2003")]);
/// # Ok::<(), rsql_seeker::SeekerError>(())
/// ```
pub fn to_sql(filter: Option<&Node>, config: &QueryConfig, values: &mut ParamList) -> Result<String> {
    let Some(node) = filter else {
        return Ok(String::new());
    };
    let mark = values.len();
    let result = validate(node, config).and_then(|()| compile_node(node, config, values));
    if result.is_err() {
        values.truncate(mark);
    }
    result
}

fn compile_node(node: &Node, config: &QueryConfig, values: &mut ParamList) -> Result<String> {
    match node {
        Node::Group(group) => compile_group(group, config, values),
        Node::Comparison(comparison) => compile_comparison(comparison, config, values),
    }
}

fn compile_group(group: &Group, config: &QueryConfig, values: &mut ParamList) -> Result<String> {
    let format = config.format();
    match group.operator {
        Connective::And | Connective::Or => {
            let joiner = format!(" {} ", format.keyword(group.operator.as_str()));
            let parts = group
                .operands
                .iter()
                .map(|operand| compile_node(operand_node(operand)?, config, values))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("({})", parts.join(&joiner)))
        }
        Connective::Not => {
            let [operand] = group.operands.as_slice() else {
                return Err(SeekerError::UnsupportedNode(format!(
                    "not with {} operands",
                    group.operands.len()
                )));
            };
            let inner = operand_node(operand)?;
            validate(inner, config)?;
            let sql = compile_node(inner, config, values)?;
            Ok(format!("{}({sql})", format.keyword("NOT")))
        }
    }
}

fn compile_comparison(node: &Comparison, config: &QueryConfig, values: &mut ParamList) -> Result<String> {
    let selectors = config.selectors();
    let selector = selectors.resolve(&node.selector);

    if let Some(sql) = maybe_execute_plugin(config, node, selector, values)? {
        return Ok(sql);
    }

    let op = Operator::parse(&node.operator)
        .ok_or_else(|| SeekerError::UnsupportedNode(format!("operator {}", node.operator)))?;
    let format = config.format();
    let sql = match op {
        Operator::Eq | Operator::Ne => equality(node, op, selector, config, values),
        Operator::In | Operator::Out => {
            let placeholder = values.push(coerce_value(node, selectors, true));
            format!("{selector} {} {placeholder}", op.sql(format))
        }
        Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
            let placeholder = values.push(coerce_value(node, selectors, false));
            format!("{selector}{}{placeholder}", op.sql(format))
        }
    };
    Ok(sql)
}

fn equality(
    node: &Comparison,
    op: Operator,
    selector: &str,
    config: &QueryConfig,
    values: &mut ParamList,
) -> String {
    let format: SqlFormat = config.format();
    let operand = node.first_operand();
    let leading = operand.starts_with('*');
    let trailing = operand.ends_with('*');

    if !leading && !trailing {
        let placeholder = values.push(coerce_value(node, config.selectors(), false));
        let symbol = if op == Operator::Eq { "=" } else { "<>" };
        return format!("{selector}{}{placeholder}", format.symbol(symbol));
    }

    // A lone `*` is both the leading and the trailing wildcard and binds `%*%`.
    let pattern = if operand == "*" {
        "%*%".to_string()
    } else {
        let inner = operand.strip_prefix('*').unwrap_or(operand);
        let inner = if trailing {
            inner.strip_suffix('*').unwrap_or(inner)
        } else {
            inner
        };
        format!(
            "{}{inner}{}",
            if leading { "%" } else { "" },
            if trailing { "%" } else { "" }
        )
    };
    let placeholder = values.push(pattern);
    let keyword = if op == Operator::Eq { "ILIKE" } else { "NOT ILIKE" };
    format!("{selector} {} {placeholder}", format.keyword(keyword))
}
