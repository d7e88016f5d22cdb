//! CLI interface and argument parsing
//!
//! This module builds the command line from the playbook's argument
//! declarations and starts the run.

pub mod app;

// Re-export main types
pub use app::*;
