//! Playbook loading

use crate::config::schema::collect_arg_specs;
use crate::config::types::{statements_from_value, Playbook, Statement};
use crate::config::unroll::unroll;
use crate::error::{DocumentError, UpError};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// Parse a playbook file from a path
pub fn parse_playbook_file(path: &Path) -> Result<Playbook, UpError> {
    let contents = fs::read_to_string(path).map_err(|e| DocumentError::Unreadable {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    parse_playbook(&contents, Some(path))
}

/// Parse a playbook from a string
pub fn parse_playbook(yaml: &str, path: Option<&Path>) -> Result<Playbook, UpError> {
    let document: Value = serde_yaml::from_str(yaml)?;
    let raw = match document {
        Value::Sequence(raw) => raw,
        _ => return Err(DocumentError::NotAList.into()),
    };

    let unrolled = unroll(&raw)?;
    let statements = statements_from_value(&Value::Sequence(unrolled), "playbook")?;
    let args = collect_arg_specs(&statements)?;

    Ok(Playbook {
        doc: leading_doc(&statements),
        args,
        statements,
        path: path.map(Path::to_path_buf),
    })
}

fn leading_doc(statements: &[Statement]) -> Option<String> {
    statements
        .first()
        .filter(|stmt| stmt.command == "doc")
        .and_then(|stmt| stmt.value.as_str())
        .map(|doc| doc.trim().to_string())
}
