//! Filter tree validation.
//!
//! [`validate`] walks the tree top-down and stops at the first problem, left
//! operands before right ones. It never touches the parameter list, so a
//! rejected filter leaves no partially bound values behind.

use crate::ast::{Comparison, Connective, Group, Node, Operand};
use crate::coerce::is_value_valid;
use crate::error::{Result, SeekerError};
use crate::op::is_known_operator;
use crate::query::QueryConfig;

/// Checks that a filter tree can be compiled against the configuration.
///
/// - `and`/`or` need at least one operand, and every operand must be a node.
/// - `not` needs exactly one node operand. The inner node is checked when the
///   compiler descends into it.
/// - A comparison needs a built-in or plugin operator and a non-empty first
///   operand. Outside lax mode the selector must be configured, and record
///   selectors also check the operand's type or enum membership unless the
///   operator's plugin skips validation. Lax mode skips both selector checks.
pub fn validate(node: &Node, config: &QueryConfig) -> Result<()> {
    match node {
        Node::Group(group) => validate_group(group, config),
        Node::Comparison(comparison) => validate_comparison(comparison, config),
    }
}

fn validate_group(group: &Group, config: &QueryConfig) -> Result<()> {
    let name = group.operator.rsql_name();
    match group.operator {
        Connective::And | Connective::Or => {
            if group.operands.is_empty() {
                return Err(SeekerError::MissingOperands(name));
            }
            for operand in &group.operands {
                validate(operand_node(operand)?, config)?;
            }
            Ok(())
        }
        Connective::Not => match group.operands.as_slice() {
            [operand] => operand_node(operand).map(|_| ()),
            [] => Err(SeekerError::MissingOperands(name)),
            [_, extra, ..] => Err(SeekerError::InvalidOperandType(describe(extra))),
        },
    }
}

pub(crate) fn operand_node(operand: &Operand) -> Result<&Node> {
    operand
        .as_node()
        .ok_or_else(|| SeekerError::InvalidOperandType(describe(operand)))
}

fn describe(operand: &Operand) -> String {
    serde_json::to_string(operand).unwrap_or_else(|_| format!("{operand:?}"))
}

fn validate_comparison(node: &Comparison, config: &QueryConfig) -> Result<()> {
    let plugin = config.plugins().find(&node.operator);
    if !is_known_operator(&node.operator) && plugin.is_none() {
        return Err(SeekerError::UnknownOperator(node.operator.clone()));
    }

    let value = node.first_operand();
    if value.is_empty() {
        return Err(SeekerError::MissingValue(node.selector.clone()));
    }
    if config.is_lax() {
        return Ok(());
    }

    let Some(selector) = config.selectors().get(&node.selector) else {
        return Err(SeekerError::UnknownSelector(node.selector.clone()));
    };

    let skip = plugin.is_some_and(|p| p.skip_validation());
    if !selector.is_record() || skip || is_value_valid(selector, value) {
        return Ok(());
    }

    tracing::debug!(
        selector = %node.selector,
        value,
        "rejecting filter value"
    );
    Err(match (selector.allowed_values(), selector.kind()) {
        (Some(allowed), _) => SeekerError::NotInEnum {
            selector: node.selector.clone(),
            value: value.to_string(),
            allowed: serde_json::to_string(allowed).unwrap_or_default(),
        },
        (None, kind) => SeekerError::InvalidValue {
            selector: node.selector.clone(),
            value: value.to_string(),
            expected: kind.map_or("type", |k| k.as_str()),
        },
    })
}
