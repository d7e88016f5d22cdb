//! Placeholder expansion for strings
//!
//! This module replaces `{{ expression }}` placeholders in text. Placeholder
//! bodies are evaluated with [`crate::runner::expr`]; undefined names render as
//! the empty string.

use crate::error::{is_undefined, TemplateError, TemplateResult};
use crate::runner::expr::{evaluate, render_value};
use crate::runner::scope::{key_name, Layered, Namespace, Vars};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("valid placeholder regex"))
}

/// Expand every placeholder in a string
///
/// Supports:
/// - `{{ name }}` - variable from the namespace
/// - `{{ env.NAME }}` - environment variables
/// - `{{ path | basename }}` - filters, including `default(x)` for undefined names
pub fn expand(text: &str, ns: &dyn Namespace) -> TemplateResult<String> {
    let re = placeholder_regex();
    if !re.is_match(text) {
        return Ok(text.to_string());
    }

    let mut result = String::with_capacity(text.len());
    let mut last = 0;

    for caps in re.captures_iter(text) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        result.push_str(&text[last..whole.start()]);

        match evaluate(body.as_str().trim(), ns) {
            Ok(value) => result.push_str(&render_value(&value)),
            Err(e) if is_undefined(&e) => {}
            Err(e) => return Err(e),
        }

        last = whole.end();
    }

    result.push_str(&text[last..]);
    Ok(result)
}

/// Expand a value: strings are expanded, anything else passes through
pub fn expand_value(value: &Value, ns: &dyn Namespace) -> TemplateResult<Value> {
    match value {
        Value::String(s) => expand(s, ns).map(Value::String),
        other => Ok(other.clone()),
    }
}

/// Expand every value of a mapping in key order.
///
/// Each key's expanded value is visible to the keys after it.
pub fn expand_mapping(mapping: &Mapping, ns: &dyn Namespace) -> TemplateResult<Vars> {
    let mut seen = Vars::new();

    for (key, value) in mapping {
        let name = key_name(key).ok_or_else(|| {
            TemplateError::Type(format!("mapping key {:?} is not a name", key))
        })?;
        let expanded = {
            let layered = Layered {
                base: ns,
                extra: &seen,
            };
            expand_value(value, &layered)?
        };
        seen.insert(name, expanded);
    }

    Ok(seen)
}
