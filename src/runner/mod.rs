//! Playbook execution engine
//!
//! This module handles the execution of statements: variable scoping,
//! placeholder expansion, conditions, and the built-in commands.

pub mod command;
pub mod context;
pub mod decrypt;
pub mod duration;
pub mod engine;
pub mod expr;
pub mod handlers;
pub mod scope;
pub mod template;
pub mod when;

// Re-export main types
pub use context::*;
pub use decrypt::Decrypt;
pub use engine::{Engine, Handler, Outcome};
pub use scope::{Namespace, Scope, Vars};
pub use template::{expand, expand_mapping, expand_value};
pub use when::evaluate_condition;
