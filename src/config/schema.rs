//! Argument declaration validation
//!
//! `args` statements declare the playbook's command-line arguments. They are
//! collected and checked here, before anything runs.

use crate::config::types::{ArgSpec, ArgType, Statement};
use crate::error::{DocumentError, DocumentResult};
use serde_yaml::Value;
use std::collections::HashSet;

/// Collect and validate every top-level `args` declaration
pub fn collect_arg_specs(statements: &[Statement]) -> DocumentResult<Vec<ArgSpec>> {
    let mut specs = Vec::new();

    for stmt in statements.iter().filter(|stmt| stmt.command == "args") {
        let declared: Vec<ArgSpec> = serde_yaml::from_value(stmt.value.clone())
            .map_err(|e| DocumentError::InvalidArgs(e.to_string()))?;
        specs.extend(declared);
    }

    validate_arg_specs(&specs)?;
    Ok(specs)
}

/// Validate a list of argument declarations
pub fn validate_arg_specs(specs: &[ArgSpec]) -> DocumentResult<()> {
    let mut seen = HashSet::new();

    for spec in specs {
        validate_name(&spec.name)?;

        if !seen.insert(spec.name.as_str()) {
            return Err(DocumentError::InvalidArgs(format!(
                "argument '{}' is declared twice",
                spec.name
            )));
        }

        if let Some(default) = &spec.default {
            validate_default(spec, default)?;
        }
    }

    Ok(())
}

fn validate_name(name: &str) -> DocumentResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(DocumentError::InvalidArgs(format!(
            "invalid argument name '{}'",
            name
        )))
    }
}

fn validate_default(spec: &ArgSpec, default: &Value) -> DocumentResult<()> {
    let ok = match spec.arg_type {
        ArgType::Int => default.as_i64().is_some(),
        ArgType::Bool => default.as_bool().is_some(),
        ArgType::Str | ArgType::Password => {
            matches!(default, Value::String(_) | Value::Number(_) | Value::Bool(_))
        }
    };

    if ok {
        Ok(())
    } else {
        Err(DocumentError::InvalidArgs(format!(
            "default for '{}' does not match its type",
            spec.name
        )))
    }
}
