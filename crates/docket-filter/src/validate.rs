use crate::config::OperationsConfig;
use crate::error::FilterError;
use crate::expression::{FilterOperation, LogicalExpression, LogicalOperator};
use crate::literal::JsonLiteral;
use crate::operator::FilterOperator;

/// Largest `$size` count; keeps the negated form exact as an `i64`.
const MAX_SIZE: f64 = i64::MAX as f64;

/// Check every operand against the rules of its operator.
///
/// Runs on the tree as parsed, before `$not` is pushed down, so `$size`
/// still carries the count the client sent.
pub(crate) fn check_operands(
    expr: &LogicalExpression,
    config: &OperationsConfig,
) -> Result<(), FilterError> {
    for child in expr.children() {
        check_operands(child, config)?;
    }
    for comparison in expr.comparisons() {
        for op in comparison.operations() {
            check_operation(op, config)?;
        }
    }
    Ok(())
}

fn check_operation(op: &FilterOperation, config: &OperationsConfig) -> Result<(), FilterError> {
    let key = op.operator.key();
    match op.operator {
        FilterOperator::IN | FilterOperator::NIN => match &op.operand {
            JsonLiteral::Array(values) if values.len() > config.max_in_operator_value_size => {
                Err(FilterError::InValuesTooMany {
                    operator: key,
                    max: config.max_in_operator_value_size,
                    actual: values.len(),
                })
            }
            JsonLiteral::Array(_) => Ok(()),
            _ => Err(invalid(key, "operand must be an array")),
        },
        FilterOperator::EXISTS => match &op.operand {
            JsonLiteral::Boolean(_) => Ok(()),
            _ => Err(invalid(key, "operand must be a boolean")),
        },
        FilterOperator::ALL | FilterOperator::NOT_ANY => match &op.operand {
            JsonLiteral::Array(values) if !values.is_empty() => Ok(()),
            _ => Err(invalid(key, "operand must be a non-empty array")),
        },
        FilterOperator::SIZE => {
            let count = match &op.operand {
                JsonLiteral::Number(n) => n.as_f64(),
                _ => None,
            };
            match count {
                Some(c) if c.fract() == 0.0 && c >= 0.0 && c < MAX_SIZE => Ok(()),
                Some(c) if c >= MAX_SIZE => Err(invalid(key, "operand is too large")),
                _ => Err(invalid(key, "operand must be a non-negative integer")),
            }
        }
        _ => Ok(()),
    }
}

fn invalid(operator: &'static str, message: &str) -> FilterError {
    FilterError::InvalidOperand {
        operator,
        message: message.to_string(),
    }
}

/// Enforce the identity-path rules on a normalized tree: one comparison at
/// most, equality or membership only, and never as a direct child of an OR
/// node.
///
/// Only the immediate parent is checked. An AND branch nested in an OR may
/// still carry the identity comparison, e.g. `{"$or": [{"_id": "x", "a": 1},
/// {"b": 2}]}`, since that branch is itself a conjunction.
pub(crate) fn check_identity(expr: &LogicalExpression, identity: &str) -> Result<(), FilterError> {
    let mut seen = 0;
    check_identity_node(expr, identity, &mut seen)
}

fn check_identity_node(
    expr: &LogicalExpression,
    identity: &str,
    seen: &mut usize,
) -> Result<(), FilterError> {
    for comparison in expr.comparisons() {
        if comparison.path() != identity {
            continue;
        }
        *seen += 1;
        if *seen > 1 {
            return Err(FilterError::MultipleIdFilters(identity.to_string()));
        }
        if expr.operator() == LogicalOperator::Or {
            return Err(FilterError::IdFilterUnderOr(identity.to_string()));
        }
        if let Some(op) = comparison
            .operations()
            .iter()
            .find(|op| !op.operator.is_equality_or_membership())
        {
            return Err(FilterError::InvalidIdOperator {
                path: identity.to_string(),
                operator: op.operator.key(),
            });
        }
    }
    for child in expr.children() {
        check_identity_node(child, identity, seen)?;
    }
    Ok(())
}
