//! Playbook loading and validation
//!
//! This module turns a YAML playbook into an unrolled list of statements
//! and collects its argument declarations.

pub mod parse;
pub mod schema;
pub mod types;
pub mod unroll;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use types::*;
pub use unroll::*;
