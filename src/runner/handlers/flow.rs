//! Control flow, variables and messages

use crate::config::Statement;
use crate::error::{ExecutionError, Result};
use crate::runner::duration::parse_timestr;
use crate::runner::engine::{Engine, Outcome};
use crate::runner::expr::render_value;
use crate::runner::handlers::{int_value, invalid, required_value_text, text_arg, value_text};
use crate::runner::when::evaluate_condition;
use serde_yaml::{Mapping, Value};
use std::thread;
use tracing::debug;

/// `doc` and `args`: consumed before the run starts
pub fn doc(_engine: &mut Engine, _stmt: &Statement) -> Result<Outcome> {
    Ok(Outcome::Done)
}

/// Print a message on stdout
pub fn echo(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    let message = match stmt.arg_or_value("msg") {
        Some(Value::String(s)) => engine.ctx.expand(s)?,
        Some(other) => render_value(other),
        None => String::new(),
    };
    println!("{}", message);
    Ok(Outcome::Done)
}

/// Store variables in the global namespace.
///
/// Takes a mapping as the primary value and/or as sibling keys; values are
/// expanded in order, each seeing the ones before it.
pub fn set(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    let mut mapping = match &stmt.value {
        Value::Mapping(m) => m.clone(),
        Value::Null => Mapping::new(),
        _ => return Err(invalid(stmt, "set", "expected a mapping of variables").into()),
    };
    for (key, value) in &stmt.args {
        mapping.insert(key.clone(), value.clone());
    }

    let expanded = engine.ctx.expand_mapping(&mapping)?;
    for (name, value) in expanded {
        debug!(%name, "set global");
        engine.ctx.set_var(name, value);
    }
    Ok(Outcome::Done)
}

/// Run the nested list
pub fn block(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    engine.run_body(stmt)?;
    Ok(Outcome::Done)
}

/// `if` and `elif`: run the nested list when the condition holds
pub fn if_(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    let taken = evaluate_condition(&stmt.value, &engine.ctx)?;
    debug!(command = %stmt.command, taken, "condition");
    if taken {
        engine.run_body(stmt)?;
    }
    Ok(Outcome::Branch(taken))
}

/// `else`: reached only when no earlier branch of the chain was taken
pub fn else_(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    engine.run_body(stmt)?;
    Ok(Outcome::Branch(true))
}

/// Sleep for a time string such as `30s`, `1h2m` or `random 5m`
pub fn pause(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    let timestr = match &stmt.value {
        Value::Null => required_value_text(&engine.ctx, stmt, "time")?,
        Value::String(s) => engine.ctx.expand(s)?,
        other => render_value(other),
    };
    let spec = parse_timestr(&timestr).map_err(|e| invalid(stmt, "time", &e.to_string()))?;
    let wait = spec.sample();

    if let Some(msg) = text_arg(&engine.ctx, stmt, "msg")? {
        engine.ctx.print_info(&msg);
    }
    engine
        .ctx
        .print_debug(&format!("Pausing for {}s", wait.as_secs()));

    thread::sleep(wait);
    Ok(Outcome::Done)
}

/// Terminate the run with an exit code (default 0)
pub fn exit(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    let code = int_value(&engine.ctx, stmt, "code")?.unwrap_or(0);
    let code = i32::try_from(code).map_err(|_| invalid(stmt, "code", "out of range"))?;

    if let Some(msg) = text_arg(&engine.ctx, stmt, "msg")? {
        if code == 0 {
            engine.ctx.print_info(&msg);
        } else {
            engine.ctx.print_error(&msg);
        }
    }
    Err(ExecutionError::Exit { code }.into())
}

/// Print a message and terminate with exit code 1
pub fn fail(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    let msg = value_text(&engine.ctx, stmt, "msg")?.unwrap_or_else(|| "failed".to_string());
    engine.ctx.print_error(&msg);
    Err(ExecutionError::Exit { code: 1 }.into())
}
