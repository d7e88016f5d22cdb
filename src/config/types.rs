//! Core playbook types
//!
//! This module defines the data structures that represent a playbook: an
//! ordered list of statements, each naming one command.

use crate::error::{DocumentError, DocumentResult};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::PathBuf;

/// Keys that never name a command
pub const RESERVED_KEYS: &[&str] = &["vars", "loop"];

/// Key holding a nested statement list
pub const BLOCK_KEY: &str = "block";

/// A loaded playbook
#[derive(Debug, Clone)]
pub struct Playbook {
    /// Description from a leading `doc` statement
    pub doc: Option<String>,

    /// Declared command-line arguments
    pub args: Vec<ArgSpec>,

    /// Statements to execute, loops already unrolled
    pub statements: Vec<Statement>,

    /// Path the playbook was loaded from
    pub path: Option<PathBuf>,
}

/// One statement: a command, its primary value and its arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Command name (the first non-reserved key)
    pub command: String,

    /// Value of the command key
    pub value: Value,

    /// Remaining argument keys, in document order
    pub args: Mapping,

    /// Local variable overrides for this statement
    pub vars: Mapping,

    /// Nested statement list, if the statement owns one
    pub body: Option<Vec<Statement>>,
}

impl Statement {
    /// Build a statement from a raw mapping.
    ///
    /// `index` is only used for error messages.
    pub fn from_mapping(index: usize, mapping: &Mapping) -> DocumentResult<Self> {
        let mut command = None;
        let mut args = Mapping::new();
        let mut vars = Mapping::new();
        let mut body = None;

        for (key, value) in mapping {
            let key = key
                .as_str()
                .ok_or_else(|| DocumentError::NonStringKey(format!("{:?}", key)))?;

            match key {
                "vars" => {
                    vars = match value {
                        Value::Mapping(m) => m.clone(),
                        Value::Null => Mapping::new(),
                        _ => return Err(DocumentError::InvalidVars(describe(&command))),
                    };
                }
                "loop" => return Err(DocumentError::InvalidLoop),
                _ if command.is_none() => {
                    command = Some((key.to_string(), value.clone()));
                }
                BLOCK_KEY => {
                    body = Some(statements_from_value(value, &describe(&command))?);
                }
                _ => {
                    args.insert(Value::String(key.to_string()), value.clone());
                }
            }
        }

        let (command, value) = command.ok_or(DocumentError::MissingCommand(index))?;
        if command == BLOCK_KEY {
            body = Some(statements_from_value(&value, &command)?);
        }

        Ok(Statement {
            command,
            value,
            args,
            vars,
            body,
        })
    }

    /// Get an argument by name
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Get an argument, falling back to the command's primary value
    pub fn arg_or_value(&self, name: &str) -> Option<&Value> {
        self.arg(name).or(match &self.value {
            Value::Null => None,
            value => Some(value),
        })
    }
}

fn describe(command: &Option<(String, Value)>) -> String {
    command
        .as_ref()
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| "statement".to_string())
}

/// Convert a raw statement list into statements
pub fn statements_from_value(value: &Value, owner: &str) -> DocumentResult<Vec<Statement>> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Mapping(mapping) => Statement::from_mapping(index, mapping),
                _ => Err(DocumentError::NotAMapping(index)),
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err(DocumentError::InvalidBlock(owner.to_string())),
    }
}

/// A declared command-line argument
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ArgSpec {
    /// Argument name; also the global variable it populates
    pub name: String,

    /// Value type
    #[serde(rename = "type", default)]
    pub arg_type: ArgType,

    /// Default value; makes the argument an optional `--name` flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Help text
    #[serde(default, alias = "help", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ArgSpec {
    /// Whether this argument is a required positional
    pub fn is_positional(&self) -> bool {
        self.default.is_none()
    }
}

/// Argument value types
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    #[default]
    Str,
    Bool,
    Int,
    Password,
}
