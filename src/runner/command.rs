//! Command execution
//!
//! This module handles the `run` and `cd` statements.

use crate::config::Statement;
use crate::error::{ExecutionError, Result};
use crate::runner::engine::{Engine, Outcome};
use crate::runner::expr::render_value;
use crate::runner::handlers::{bool_arg, required_value_text, text_arg};
use crate::runner::context::{Context, Verbosity};
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use tracing::debug;

/// Run a shell line through the context's interpreter.
///
/// Arguments: the line (primary value or `cmd`), `dir`, `creates`,
/// `ignore_failure`.
pub fn run(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    let ctx = &engine.ctx;
    let exec_str = required_value_text(ctx, stmt, "cmd")?;

    if let Some(creates) = text_arg(ctx, stmt, "creates")? {
        let target = ctx.resolve_path(&creates);
        if target.exists() {
            ctx.print_debug(&format!(
                "Skipping '{}': {} exists",
                exec_str,
                target.display()
            ));
            return Ok(Outcome::Done);
        }
    }

    let working_dir = match text_arg(ctx, stmt, "dir")? {
        Some(dir) => ctx.resolve_path(&dir),
        None => ctx.working_dir.clone(),
    };
    let ignore_failure = bool_arg(ctx, stmt, "ignore_failure", false)?;

    if ctx.verbosity >= Verbosity::Normal {
        eprintln!("[RUN] {}", exec_str);
    }

    let status = execute_command(&exec_str, &working_dir, ctx)?;
    if status.success() {
        return Ok(Outcome::Done);
    }

    if ignore_failure {
        ctx.print_warn(&format!(
            "'{}' failed with exit code {:?}, ignoring",
            exec_str,
            status.code()
        ));
        Ok(Outcome::Done)
    } else {
        Err(ExecutionError::CommandFailed(status.code()).into())
    }
}

/// Change the engine's working directory
pub fn cd(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    let path = required_value_text(&engine.ctx, stmt, "path")?;
    let target = engine.ctx.resolve_path(&path);

    if !target.is_dir() {
        return Err(ExecutionError::Missing(target).into());
    }

    debug!(dir = %target.display(), "working directory");
    engine.ctx.working_dir = target;
    Ok(Outcome::Done)
}

/// Spawn `exec_str` with the interpreter, exporting scalar variables as
/// environment variables
pub fn execute_command(
    exec_str: &str,
    working_dir: &Path,
    ctx: &Context,
) -> Result<std::process::ExitStatus> {
    let (program, interpreter_args) = ctx
        .interpreter
        .split_first()
        .ok_or(ExecutionError::CommandFailed(None))?;

    let mut command = StdCommand::new(program);
    command.args(interpreter_args);
    command.arg(exec_str);
    command.current_dir(working_dir);

    command.stdin(Stdio::inherit());
    command.stdout(Stdio::inherit());
    command.stderr(Stdio::inherit());

    for (key, value) in ctx.scope.merged() {
        if is_env_name(&key) && !value.is_sequence() && !value.is_mapping() {
            command.env(key, render_value(&value));
        }
    }

    command.status().map_err(|e| {
        ExecutionError::File {
            action: "spawn",
            path: working_dir.to_path_buf(),
            source: e,
        }
        .into()
    })
}

fn is_env_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
