//! File handlers: `copy`, `template`, `mkdir`, `rm` and `chmod`

use crate::config::Statement;
use crate::error::{ExecutionError, Result};
use crate::perms::resolve_value;
use crate::runner::engine::{Engine, Outcome};
use crate::runner::handlers::{bool_arg, invalid, required_text, required_value_text, text_arg};
use crate::runner::scope::Vars;
use serde_yaml::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Copy a file
pub fn copy(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    install(engine, stmt, false)
}

/// Expand a source file's placeholders and write the result
pub fn template(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    install(engine, stmt, true)
}

fn install(engine: &mut Engine, stmt: &Statement, render: bool) -> Result<Outcome> {
    let ctx = &engine.ctx;
    let src = required_text(ctx, stmt, "src")?;
    let dst = required_text(ctx, stmt, "dst")?;

    let source = ctx
        .find_source(&src)
        .ok_or_else(|| ExecutionError::Missing(ctx.source_path(&src)))?;

    let mut target = ctx.resolve_path(&dst);
    if target.is_dir() {
        if let Some(name) = source.file_name() {
            target = target.join(name);
        }
    }

    if bool_arg(ctx, stmt, "skip_if_exists", false)? && target.exists() {
        ctx.print_debug(&format!("Skipping {}: already exists", target.display()));
        return Ok(Outcome::Done);
    }

    ctx.print_step(
        &stmt.command,
        &format!("{} -> {}", source.display(), target.display()),
    );

    let decrypted = match text_arg(ctx, stmt, "decrypt_password")? {
        Some(password) if !password.is_empty() => {
            let decryptor = engine
                .decryptor()
                .ok_or_else(|| ExecutionError::NoDecryptor(source.clone()))?;
            let plain = decryptor
                .decrypt(&source, &password)
                .map_err(|e| ExecutionError::Decrypt {
                    path: source.clone(),
                    source: e,
                })?;
            Some(plain)
        }
        _ => None,
    };
    let readable = decrypted.as_deref().unwrap_or(&source);

    let written = if render {
        let mut extra = Vars::new();
        extra.insert("src".to_string(), path_value(&source));
        extra.insert("dst".to_string(), path_value(&target));

        fs::read_to_string(readable)
            .map_err(|e| file_error("read", readable, e))
            .and_then(|text| Ok(ctx.expand_with(&text, &extra)?))
            .and_then(|text| fs::write(&target, text).map_err(|e| file_error("write", &target, e)))
    } else {
        fs::copy(readable, &target)
            .map(|_| ())
            .map_err(|e| file_error("copy", &target, e))
    };

    if let Some(plain) = &decrypted {
        if let Err(e) = fs::remove_file(plain) {
            debug!(path = %plain.display(), error = %e, "could not remove decrypted copy");
        }
    }
    written?;

    if let Some(mode) = mode_arg(engine, stmt)? {
        apply_mode(&target, &mode, false)?;
    }

    Ok(Outcome::Done)
}

/// Create a directory
pub fn mkdir(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    let ctx = &engine.ctx;
    let path = ctx.resolve_path(&required_value_text(ctx, stmt, "path")?);

    if path.exists() {
        if bool_arg(ctx, stmt, "skip_if_exists", false)? {
            ctx.print_debug(&format!("Skipping {}: already exists", path.display()));
            return Ok(Outcome::Done);
        }
        return Err(ExecutionError::AlreadyExists(path).into());
    }

    ctx.print_step("mkdir", &path.display().to_string());

    let created = if bool_arg(ctx, stmt, "parents", true)? {
        fs::create_dir_all(&path)
    } else {
        fs::create_dir(&path)
    };
    created.map_err(|e| file_error("create", &path, e))?;

    if let Some(mode) = mode_arg(engine, stmt)? {
        apply_mode(&path, &mode, false)?;
    }

    Ok(Outcome::Done)
}

/// Remove files or directories matching a glob
pub fn rm(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    let ctx = &engine.ctx;
    let pattern = required_value_text(ctx, stmt, "path")?;
    let recursive = bool_arg(ctx, stmt, "recursive", false)?;
    let paths = matching_paths(ctx.resolve_path(&pattern), stmt)?;

    if paths.is_empty() {
        if bool_arg(ctx, stmt, "skip_if_missing", false)? {
            ctx.print_debug(&format!("Nothing to remove for {}", pattern));
            return Ok(Outcome::Done);
        }
        return Err(ExecutionError::Missing(ctx.resolve_path(&pattern)).into());
    }

    for path in paths {
        ctx.print_step("rm", &path.display().to_string());
        let removed = if path.is_dir() && !path.is_symlink() {
            if recursive {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_dir(&path)
            }
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| file_error("remove", &path, e))?;
    }

    Ok(Outcome::Done)
}

/// Change permissions of paths matching a glob
pub fn chmod(engine: &mut Engine, stmt: &Statement) -> Result<Outcome> {
    let ctx = &engine.ctx;
    let pattern = required_value_text(ctx, stmt, "path")?;
    let mode = mode_arg(engine, stmt)?.ok_or_else(|| ExecutionError::MissingArgument {
        command: stmt.command.clone(),
        name: "mode".to_string(),
    })?;
    let recursive = bool_arg(ctx, stmt, "recursive", false)?;
    let paths = matching_paths(ctx.resolve_path(&pattern), stmt)?;

    if paths.is_empty() {
        return Err(ExecutionError::Missing(ctx.resolve_path(&pattern)).into());
    }

    for path in paths {
        ctx.print_step("chmod", &path.display().to_string());
        apply_mode(&path, &mode, recursive)?;
    }

    Ok(Outcome::Done)
}

/// The `mode` argument, expanded when it is text
fn mode_arg(engine: &Engine, stmt: &Statement) -> Result<Option<Value>> {
    match stmt.arg("mode") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(Value::String(engine.ctx.expand(s)?))),
        Some(number @ Value::Number(_)) => Ok(Some(number.clone())),
        Some(_) => Err(invalid(stmt, "mode", "expected a number or permission expression").into()),
    }
}

fn matching_paths(pattern: PathBuf, stmt: &Statement) -> Result<Vec<PathBuf>> {
    let pattern = pattern.to_string_lossy().into_owned();
    let entries = glob::glob(&pattern).map_err(|e| invalid(stmt, "path", &e.to_string()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ExecutionError::File {
            action: "read",
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;
        paths.push(path);
    }
    Ok(paths)
}

/// Resolve `mode` against the path's current mode and apply it, descending
/// into directories when `recursive` is set
fn apply_mode(path: &Path, mode: &Value, recursive: bool) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| file_error("stat", path, e))?;
    let is_dir = metadata.is_dir();
    let resolved = resolve_value(mode, current_mode(&metadata), is_dir, None)?;

    debug!(path = %path.display(), mode = %format!("{:o}", resolved), "chmod");
    set_mode(path, resolved).map_err(|e| file_error("chmod", path, e))?;

    if recursive && is_dir {
        let entries = fs::read_dir(path).map_err(|e| file_error("read", path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| file_error("read", path, e))?;
            apply_mode(&entry.path(), mode, true)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn current_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn current_mode(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, permissions)
}

fn path_value(path: &Path) -> Value {
    Value::String(path.to_string_lossy().into_owned())
}

fn file_error(action: &'static str, path: &Path, source: io::Error) -> crate::error::UpError {
    ExecutionError::File {
        action,
        path: path.to_path_buf(),
        source,
    }
    .into()
}
