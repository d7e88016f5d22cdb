//! Error types for uprun

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for uprun operations
pub type Result<T> = std::result::Result<T, UpError>;

/// Main error type for uprun
#[derive(Error, Debug)]
pub enum UpError {
    /// Malformed playbook structure
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Statement execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Placeholder expansion errors
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Permission expression errors
    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl UpError {
    /// Process exit code for this error.
    ///
    /// A terminate statement carries its own code; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            UpError::Execution(ExecutionError::Exit { code }) => *code,
            _ => 1,
        }
    }

    /// Whether this error is a deliberate terminate statement rather than a failure
    pub fn is_exit(&self) -> bool {
        matches!(self, UpError::Execution(ExecutionError::Exit { .. }))
    }
}

/// Structural problems in the statement list
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read playbook '{path}': {error}")]
    Unreadable { path: PathBuf, error: String },

    #[error("Playbook must be a list of statements")]
    NotAList,

    #[error("Statement {0} is not a mapping")]
    NotAMapping(usize),

    #[error("Statement {0} has no command")]
    MissingCommand(usize),

    #[error("Statement key {0:?} is not a string")]
    NonStringKey(String),

    #[error("'vars' of '{0}' must be a mapping")]
    InvalidVars(String),

    #[error("'loop' must be a list of mappings")]
    InvalidLoop,

    #[error("'block' of '{0}' must be a list of statements")]
    InvalidBlock(String),

    #[error("Invalid argument declaration: {0}")]
    InvalidArgs(String),

    #[error("'{command}' must directly follow 'if' or 'elif'")]
    MisplacedBranch { command: String },
}

/// Statement execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("Failed to evaluate condition {condition:?}: {error}")]
    ConditionEvaluation { condition: String, error: String },

    #[error("Command failed with exit code {0:?}")]
    CommandFailed(Option<i32>),

    #[error("'{command}' requires argument '{name}'")]
    MissingArgument { command: String, name: String },

    #[error("Invalid value for '{name}' in '{command}': {error}")]
    InvalidArgument {
        command: String,
        name: String,
        error: String,
    },

    #[error("{action} '{path}': {source}")]
    File {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{0}' already exists")]
    AlreadyExists(PathBuf),

    #[error("'{0}' does not exist")]
    Missing(PathBuf),

    #[error("No decryptor configured for encrypted source '{0}'")]
    NoDecryptor(PathBuf),

    #[error("Failed to decrypt '{path}': {source}")]
    Decrypt {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Terminated with exit code {code}")]
    Exit { code: i32 },
}

/// Placeholder and expression errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("Invalid expression syntax: {0}")]
    InvalidSyntax(String),

    #[error("Type error: {0}")]
    Type(String),

    #[error("Unknown filter '{0}'")]
    UnknownFilter(String),
}

/// Permission resolver errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PermissionError {
    #[error("Invalid permission expression '{0}'")]
    InvalidExpression(String),
}

/// Specialized result type for document operations
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for template and expression operations
pub type TemplateResult<T> = std::result::Result<T, TemplateError>;

/// Specialized result type for permission resolution
pub type PermissionResult<T> = std::result::Result<T, PermissionError>;

/// Helper to tell whether an expression error is only an undefined name
/// (which placeholders render as empty and `default` replaces)
pub fn is_undefined(err: &TemplateError) -> bool {
    matches!(err, TemplateError::UndefinedVariable(_))
}
