//! Statement execution engine
//!
//! The engine walks a statement list in order, pushing one local frame per
//! statement and dispatching to the handler registered for its command. It
//! also enforces `if`/`elif`/`else` sequencing for each list it runs.

use crate::config::{Playbook, Statement};
use crate::error::{DocumentError, ExecutionError, Result};
use crate::runner::decrypt::Decrypt;
use crate::runner::handlers;
use crate::runner::Context;
use std::collections::HashMap;
use tracing::{debug, trace};

/// A command implementation
pub type Handler = fn(&mut Engine, &Statement) -> Result<Outcome>;

/// What a handler reports back to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// An ordinary statement finished
    Done,

    /// A conditional finished; `true` when its branch was taken
    Branch(bool),
}

/// Runs statements against an execution context
pub struct Engine {
    /// Working directory, variables and output settings
    pub ctx: Context,

    handlers: HashMap<String, Handler>,
    decryptor: Option<Box<dyn Decrypt>>,
}

impl Engine {
    /// Create an engine with the built-in commands registered
    pub fn new(ctx: Context) -> Self {
        let mut engine = Engine {
            ctx,
            handlers: HashMap::new(),
            decryptor: None,
        };
        handlers::register_builtins(&mut engine);
        engine
    }

    /// Register a handler, replacing any existing one of the same name
    pub fn register(&mut self, command: impl Into<String>, handler: Handler) {
        self.handlers.insert(command.into(), handler);
    }

    /// Whether a command has a handler
    pub fn has_command(&self, command: &str) -> bool {
        self.handlers.contains_key(command)
    }

    /// Set the collaborator used for `decrypt_password`
    pub fn with_decryptor(mut self, decryptor: Box<dyn Decrypt>) -> Self {
        self.decryptor = Some(decryptor);
        self
    }

    /// Get the configured decryptor, if any
    pub fn decryptor(&self) -> Option<&dyn Decrypt> {
        self.decryptor.as_deref()
    }

    /// Run every statement of a playbook
    pub fn run_playbook(&mut self, playbook: &Playbook) -> Result<()> {
        if let Some(path) = &playbook.path {
            self.ctx
                .print_debug(&format!("Running playbook: {}", path.display()));
        }
        self.run(&playbook.statements)
    }

    /// Run a statement list in order.
    ///
    /// `elif` and `else` must directly follow `if` or `elif` in the same list.
    /// Once a branch of a chain is taken, the rest of the chain is skipped
    /// without evaluating its conditions.
    pub fn run(&mut self, statements: &[Statement]) -> Result<()> {
        let mut previous: Option<&str> = None;
        let mut branch_taken = false;

        for stmt in statements {
            let command = stmt.command.as_str();

            if matches!(command, "elif" | "else") {
                if !matches!(previous, Some("if" | "elif")) {
                    return Err(DocumentError::MisplacedBranch {
                        command: command.to_string(),
                    }
                    .into());
                }

                if branch_taken {
                    trace!(command, "skipping branch, chain already taken");
                    previous = Some(command);
                    continue;
                }
            }

            let outcome = self.execute(stmt)?;
            branch_taken = matches!(outcome, Outcome::Branch(true));
            previous = Some(command);
        }

        Ok(())
    }

    /// Execute one statement inside its own local frame
    pub fn execute(&mut self, stmt: &Statement) -> Result<Outcome> {
        let handler = *self
            .handlers
            .get(&stmt.command)
            .ok_or_else(|| ExecutionError::UnknownCommand(stmt.command.clone()))?;

        let frame = self.ctx.expand_mapping(&stmt.vars)?;

        debug!(
            command = %stmt.command,
            depth = self.ctx.scope.depth(),
            vars = frame.len(),
            "dispatch"
        );

        self.ctx.scope.push_frame(frame);
        let result = handler(self, stmt);
        self.ctx.scope.pop_frame();

        trace!(command = %stmt.command, ok = result.is_ok(), "done");
        result
    }

    /// Run the nested statement list a statement owns, if any
    pub fn run_body(&mut self, stmt: &Statement) -> Result<()> {
        match &stmt.body {
            Some(body) => self.run(body),
            None => Ok(()),
        }
    }
}
