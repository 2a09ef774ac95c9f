//! Command library
//!
//! Every sentence invokes a [`Command`]. Commands that run nested scripts do
//! not call the executor themselves; they return continuations and let the
//! process trampoline drive them.

use std::rc::Rc;

use super::compiler::Program;
use super::scope::ScopeRef;
use super::types::control::{Outcome, OutcomeResult};
use super::types::values::Value;

pub mod basic;
pub mod catch;
pub mod collections;
pub mod conditional;
pub mod loops;
pub mod numbers;
pub mod procs;
pub mod variables;

pub use numbers::NumberCommand;

/* ===================== Command Trait ===================== */

pub trait Command {
    /// `args[0]` is the word the command was invoked by
    fn execute(&self, args: &[Value], scope: &ScopeRef) -> Outcome;

    /// Resume after a YIELD this command returned
    ///
    /// `result` is the suspended YIELD with its value replaced by the one
    /// supplied through `yield_back`.
    fn resume(&self, result: Outcome, _scope: &ScopeRef) -> Outcome {
        Outcome::ok(result.value)
    }
}

/// Stateless command backed by a plain function
pub struct NativeCommand(pub fn(&[Value], &ScopeRef) -> Outcome);

impl Command for NativeCommand {
    fn execute(&self, args: &[Value], scope: &ScopeRef) -> Outcome {
        (self.0)(args, scope)
    }
}

/// Invocation through a tuple: `(cmd a) b` runs `cmd a b`
pub struct ExpandPrefixCommand {
    command: Rc<dyn Command>,
    prefix: Rc<Vec<Value>>,
}

impl ExpandPrefixCommand {
    pub fn new(command: Rc<dyn Command>, prefix: Rc<Vec<Value>>) -> Self {
        Self { command, prefix }
    }
}

impl Command for ExpandPrefixCommand {
    fn execute(&self, args: &[Value], scope: &ScopeRef) -> Outcome {
        let mut expanded = Vec::with_capacity(self.prefix.len() + args.len());
        expanded.extend(self.prefix.iter().cloned());
        expanded.extend(args.iter().skip(1).cloned());
        self.command.execute(&expanded, scope)
    }

    fn resume(&self, result: Outcome, scope: &ScopeRef) -> Outcome {
        self.command.resume(result, scope)
    }
}

/* ===================== Helpers ===================== */

pub(crate) fn wrong_args(usage: &str) -> Outcome {
    Outcome::error(format!("wrong # args: should be \"{}\"", usage))
}

/// Compiled program of a script argument
pub(crate) fn body_program(value: &Value) -> OutcomeResult<Rc<Program>> {
    match value {
        Value::Script(script) => Ok(script.program()),
        _ => Err(Outcome::error("body must be a script")),
    }
}

/* ===================== Registration ===================== */

pub fn register_core_commands(scope: &ScopeRef) {
    basic::register(scope);
    variables::register(scope);
    collections::register(scope);
    procs::register(scope);
    conditional::register(scope);
    loops::register(scope);
    catch::register(scope);
}
