//! Built-in commands
//!
//! Every handler receives its statement unexpanded and expands the fields it
//! treats as templated through the helpers below.

pub mod files;
pub mod flow;

use crate::config::Statement;
use crate::error::{ExecutionError, Result, UpError};
use crate::runner::command;
use crate::runner::engine::Engine;
use crate::runner::expr::render_value;
use crate::runner::Context;
use serde_yaml::Value;

/// Register every built-in command on an engine
pub fn register_builtins(engine: &mut Engine) {
    engine.register("doc", flow::doc);
    engine.register("args", flow::doc);
    engine.register("echo", flow::echo);
    engine.register("set", flow::set);
    engine.register("block", flow::block);
    engine.register("if", flow::if_);
    engine.register("elif", flow::if_);
    engine.register("else", flow::else_);
    engine.register("pause", flow::pause);
    engine.register("exit", flow::exit);
    engine.register("fail", flow::fail);
    engine.register("run", command::run);
    engine.register("cd", command::cd);
    engine.register("copy", files::copy);
    engine.register("template", files::template);
    engine.register("mkdir", files::mkdir);
    engine.register("rm", files::rm);
    engine.register("chmod", files::chmod);
}

/// Expanded text of an argument, if present.
///
/// Scalars are rendered as text; collections are rejected.
pub fn text_arg(ctx: &Context, stmt: &Statement, name: &str) -> Result<Option<String>> {
    expand_text(ctx, stmt, name, stmt.arg(name))
}

/// Expanded text of an argument, falling back to the command's primary value
pub fn value_text(ctx: &Context, stmt: &Statement, name: &str) -> Result<Option<String>> {
    expand_text(ctx, stmt, name, stmt.arg_or_value(name))
}

/// Like [`text_arg`], but the argument must be present
pub fn required_text(ctx: &Context, stmt: &Statement, name: &str) -> Result<String> {
    text_arg(ctx, stmt, name)?.ok_or_else(|| missing(stmt, name))
}

/// Like [`value_text`], but one of the two must be present
pub fn required_value_text(ctx: &Context, stmt: &Statement, name: &str) -> Result<String> {
    value_text(ctx, stmt, name)?.ok_or_else(|| missing(stmt, name))
}

fn expand_text(
    ctx: &Context,
    stmt: &Statement,
    name: &str,
    value: Option<&Value>,
) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(ctx.expand(s)?)),
        Some(value @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(render_value(value))),
        Some(_) => Err(invalid(stmt, name, "expected text").into()),
    }
}

fn missing(stmt: &Statement, name: &str) -> UpError {
    ExecutionError::MissingArgument {
        command: stmt.command.clone(),
        name: name.to_string(),
    }
    .into()
}

/// A boolean argument; strings are expanded and read as yes/no
pub fn bool_arg(ctx: &Context, stmt: &Statement, name: &str, default: bool) -> Result<bool> {
    match stmt.arg(name) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => {
            let expanded = ctx.expand(s)?;
            parse_bool(&expanded).ok_or_else(|| {
                invalid(stmt, name, &format!("'{}' is not a boolean", expanded)).into()
            })
        }
        Some(_) => Err(invalid(stmt, name, "expected a boolean").into()),
    }
}

/// An integer argument, falling back to the primary value
pub fn int_value(ctx: &Context, stmt: &Statement, name: &str) -> Result<Option<i64>> {
    match stmt.arg_or_value(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid(stmt, name, "expected an integer").into()),
        Some(Value::String(s)) => {
            let expanded = ctx.expand(s)?;
            expanded.trim().parse().map(Some).map_err(|_| {
                invalid(stmt, name, &format!("'{}' is not an integer", expanded)).into()
            })
        }
        Some(_) => Err(invalid(stmt, name, "expected an integer").into()),
    }
}

/// Read `true/false/yes/no/on/off/1/0`
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Build an invalid-argument error for a statement
pub fn invalid(stmt: &Statement, name: &str, error: &str) -> ExecutionError {
    ExecutionError::InvalidArgument {
        command: stmt.command.clone(),
        name: name.to_string(),
        error: error.to_string(),
    }
}
