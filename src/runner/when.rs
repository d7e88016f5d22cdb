//! Condition evaluation
//!
//! This module handles evaluating the conditions of `if` and `elif`.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::expr::{evaluate, is_truthy};
use crate::runner::Context;
use serde_yaml::Value;

/// Evaluate a condition against the context's namespace.
///
/// Booleans are taken as-is. Strings are expanded, then evaluated as an
/// expression. Any failure is a [`ExecutionError::ConditionEvaluation`].
pub fn evaluate_condition(condition: &Value, ctx: &Context) -> ExecutionResult<bool> {
    let text = match condition {
        Value::Bool(b) => return Ok(*b),
        Value::String(s) => s,
        other => {
            return Err(condition_error(
                &format!("{:?}", other),
                "condition must be a boolean or an expression",
            ))
        }
    };

    let expanded = ctx
        .expand(text)
        .map_err(|e| condition_error(text, &e.to_string()))?;

    let value = evaluate(&expanded, &ctx.scope).map_err(|e| condition_error(text, &e.to_string()))?;
    Ok(is_truthy(&value))
}

fn condition_error(condition: &str, error: &str) -> ExecutionError {
    ExecutionError::ConditionEvaluation {
        condition: condition.to_string(),
        error: error.to_string(),
    }
}
