//! uprun - a small YAML playbook runner
//!
//! A playbook is a list of statements, each naming one command. The `up`
//! binary loads a playbook, turns its declared arguments into command-line
//! options and executes the statements in order.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod perms;
pub mod runner;

// Re-export commonly used types
pub use error::{Result, UpError};

/// Current version of uprun
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
