//! Execution context for playbook running
//!
//! The context tracks all the state needed while statements execute: the
//! working directory, the variable scope and how loudly to report progress.

use crate::error::TemplateResult;
use crate::runner::expr::expand_home;
use crate::runner::scope::{Layered, Scope, Vars};
use crate::runner::template;
use colored::Colorize;
use serde_yaml::{Mapping, Value};
use std::env;
use std::path::{Path, PathBuf};

/// Execution context that tracks state during a run
pub struct Context {
    /// Current working directory; relative destinations resolve against it
    pub working_dir: PathBuf,

    /// Playbook file path
    pub playbook_path: Option<PathBuf>,

    /// Global variables and the local frame stack
    pub scope: Scope,

    /// Interpreter for `run` statements (e.g., ["bash", "-c"])
    pub interpreter: Vec<String>,

    /// Search path for source files (`UP_FILES_PATH`)
    pub files_path: Option<String>,

    /// Verbosity level
    pub verbosity: Verbosity,
}

/// Environment variable overriding the source search path
pub const FILES_PATH_VAR: &str = "UP_FILES_PATH";

/// Search path used when `UP_FILES_PATH` is unset
pub const DEFAULT_FILES_PATH: &str = ".../files:...";

/// Search path entry prefix standing for the playbook directory
const PLAYBOOK_DIR_MARKER: &str = "...";

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Context {
    /// Create a new context with default settings
    pub fn new() -> Self {
        Context {
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            playbook_path: None,
            scope: Scope::new(),
            interpreter: vec!["sh".to_string(), "-c".to_string()],
            files_path: env::var(FILES_PATH_VAR).ok(),
            verbosity: Verbosity::Normal,
        }
    }

    /// Create a context with a specific working directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    /// Set the playbook file path
    pub fn with_playbook_path(mut self, path: PathBuf) -> Self {
        self.playbook_path = Some(path);
        self
    }

    /// Set the global variables
    pub fn with_globals(mut self, globals: Vars) -> Self {
        self.scope = Scope::with_globals(globals);
        self
    }

    /// Set the interpreter
    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Set the source search path
    pub fn with_files_path(mut self, files_path: Option<String>) -> Self {
        self.files_path = files_path;
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Get a variable from the effective namespace
    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.scope.get(name)
    }

    /// Set a global variable
    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        self.scope.set_global(name, value);
    }

    /// Get the directory holding the playbook (or the working dir)
    pub fn playbook_dir(&self) -> PathBuf {
        self.playbook_path
            .as_ref()
            .and_then(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.working_dir.clone())
    }

    /// Resolve a destination path against the working directory
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        self.working_dir.join(expand_home(path))
    }

    /// Resolve a source path against the playbook directory
    pub fn source_path(&self, path: &str) -> PathBuf {
        self.playbook_dir().join(expand_home(path))
    }

    /// Directories searched for relative source files, in order.
    ///
    /// Entries are separated by `:`; a leading `...` stands for the playbook
    /// directory.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let playbook_dir = self.playbook_dir();
        self.files_path
            .as_deref()
            .unwrap_or(DEFAULT_FILES_PATH)
            .split(':')
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.strip_prefix(PLAYBOOK_DIR_MARKER) {
                Some(rest) => playbook_dir.join(rest.trim_start_matches('/')),
                None => expand_home(entry),
            })
            .collect()
    }

    /// Find a source file: absolute paths are used as-is, relative ones are
    /// looked up along [`Context::search_dirs`].
    pub fn find_source(&self, path: &str) -> Option<PathBuf> {
        let expanded = expand_home(path);
        if expanded.is_absolute() {
            return expanded.exists().then_some(expanded);
        }

        self.search_dirs()
            .into_iter()
            .map(|dir| dir.join(&expanded))
            .find(|candidate| candidate.exists())
    }

    /// Expand placeholders in text against the current namespace
    pub fn expand(&self, text: &str) -> TemplateResult<String> {
        template::expand(text, &self.scope)
    }

    /// Expand placeholders with extra names layered over the namespace
    pub fn expand_with(&self, text: &str, extra: &Vars) -> TemplateResult<String> {
        let layered = Layered {
            base: &self.scope,
            extra,
        };
        template::expand(text, &layered)
    }

    /// Expand a value; non-strings pass through
    pub fn expand_value(&self, value: &Value) -> TemplateResult<Value> {
        template::expand_value(value, &self.scope)
    }

    /// Expand a whole mapping with sequential visibility
    pub fn expand_mapping(&self, mapping: &Mapping) -> TemplateResult<Vars> {
        template::expand_mapping(mapping, &self.scope)
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", "[INFO]".green(), message);
        }
    }

    /// Print warning message
    pub fn print_warn(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("{} {}", "[WARN]".yellow(), message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("{} {}", "[ERROR]".red().bold(), message);
        }
    }

    /// Print debug message (only in verbose mode)
    pub fn print_debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("{} {}", "[DEBUG]".dimmed(), message);
        }
    }

    /// Print a step announcement
    pub fn print_step(&self, command: &str, detail: &str) {
        if detail.is_empty() {
            self.print_info(command);
        } else {
            self.print_info(&format!("{} {}", command.bold(), detail));
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
