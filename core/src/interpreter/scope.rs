//! Scopes and name resolution
//!
//! A [`Scope`] pairs a [`Context`] (constants, variables, commands) with its
//! own ephemeral locals. Variables never leak across contexts, while command
//! lookup walks the parent chain so builtins stay visible everywhere.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use super::commands::{self, Command, ExpandPrefixCommand, NumberCommand};
use super::compiler::{Compiler, Program};
use super::executor::{Executor, ProgramState};
use super::parser::{self, ParseError};
use super::process::{Process, ProcessOptions};
use super::types::control::{Outcome, OutcomeResult};
use super::types::values::{parse_number, Value};

/* ===================== Context ===================== */

/// Named storage shared by every scope created over it
#[derive(Default)]
pub struct Context {
    parent: Option<Rc<Context>>,
    constants: RefCell<HashMap<String, Value>>,
    variables: RefCell<HashMap<String, Value>>,
    commands: RefCell<HashMap<String, Rc<dyn Command>>>,
}

impl Context {
    fn new(parent: Option<Rc<Context>>) -> Self {
        Self {
            parent,
            ..Self::default()
        }
    }

    fn command(&self, name: &str) -> Option<Rc<dyn Command>> {
        if let Some(command) = self.commands.borrow().get(name) {
            return Some(command.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.command(name))
    }
}

/* ===================== Scope ===================== */

pub type ScopeRef = Rc<Scope>;

pub struct Scope {
    context: Rc<Context>,
    locals: RefCell<HashMap<String, Value>>,
}

impl Scope {
    /// Root scope with the core command library registered
    pub fn new_root() -> ScopeRef {
        let scope = Rc::new(Self::over(Rc::new(Context::new(None))));
        commands::register_core_commands(&scope);
        scope
    }

    fn over(context: Rc<Context>) -> Self {
        Self {
            context,
            locals: RefCell::new(HashMap::new()),
        }
    }

    /// Scope with a fresh context whose parent serves command lookup only
    pub fn child_of(context: Rc<Context>) -> ScopeRef {
        Rc::new(Self::over(Rc::new(Context::new(Some(context)))))
    }

    /// Lexical nesting: isolated variables, inherited commands
    pub fn new_child_scope(&self) -> ScopeRef {
        Self::child_of(self.context.clone())
    }

    /// Dynamic nesting: same context, fresh locals
    pub fn new_local_scope(&self) -> ScopeRef {
        Rc::new(Self::over(self.context.clone()))
    }

    pub fn context(&self) -> &Rc<Context> {
        &self.context
    }

    /* ===================== Processes ===================== */

    pub fn prepare_process(self: &Rc<Self>, program: Rc<Program>) -> Process {
        self.prepare_process_with(program, ProcessOptions::default())
    }

    pub fn prepare_process_with(
        self: &Rc<Self>,
        program: Rc<Program>,
        options: ProcessOptions,
    ) -> Process {
        Process::new(self.clone(), program, options)
    }

    /// Parse and compile `source`, then wrap it in a process
    pub fn prepare_script(self: &Rc<Self>, source: &str) -> Result<Process, ParseError> {
        let script = parser::parse(source)?;
        let program = Compiler::new(None).compile(&script);
        Ok(self.prepare_process(Rc::new(program)))
    }

    pub fn execute(self: &Rc<Self>, program: &Program, state: &mut ProgramState) -> Outcome {
        Executor::new(self).execute(program, state)
    }

    /* ===================== Resolution ===================== */

    /// Read order: locals, constants, variables
    pub fn resolve_variable(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.locals.borrow().get(name) {
            return Some(value.clone());
        }
        if let Some(value) = self.context.constants.borrow().get(name) {
            return Some(value.clone());
        }
        self.context.variables.borrow().get(name).cloned()
    }

    pub fn resolve_command(&self, value: &Value) -> OutcomeResult<Rc<dyn Command>> {
        match value {
            Value::Command(command) => Ok(command.clone()),
            Value::Tuple(prefix) => {
                let Some(head) = prefix.first() else {
                    return Err(Outcome::error("empty command prefix"));
                };
                let command = self.resolve_command(head)?;
                Ok(Rc::new(ExpandPrefixCommand::new(command, prefix.clone())))
            }
            other => {
                let name = other
                    .as_text()
                    .map_err(|_| Outcome::error("invalid command name"))?;
                if let Some(command) = self.context.command(&name) {
                    return Ok(command);
                }
                if parse_number(&name).is_some() {
                    return Ok(Rc::new(NumberCommand));
                }
                Err(Outcome::error(format!("cannot resolve command \"{}\"", name)))
            }
        }
    }

    pub fn register_named_command(&self, name: &str, command: Rc<dyn Command>) {
        debug!(command = name, "registering command");
        self.context
            .commands
            .borrow_mut()
            .insert(name.to_string(), command);
    }

    pub fn has_local_command(&self, name: &str) -> bool {
        self.context.commands.borrow().contains_key(name)
    }

    /* ===================== Definitions ===================== */

    fn check_constant(&self, name: &str) -> Outcome {
        if self.locals.borrow().contains_key(name) {
            return Outcome::error(format!(
                "cannot define constant \"{}\": local already exists",
                name
            ));
        }
        if self.context.constants.borrow().contains_key(name) {
            return Outcome::error(format!("cannot redefine constant \"{}\"", name));
        }
        if self.context.variables.borrow().contains_key(name) {
            return Outcome::error(format!(
                "cannot define constant \"{}\": variable already exists",
                name
            ));
        }
        Outcome::default()
    }

    fn check_variable(&self, name: &str) -> Outcome {
        if self.locals.borrow().contains_key(name) {
            return Outcome::error(format!("cannot redefine local \"{}\"", name));
        }
        if self.context.constants.borrow().contains_key(name) {
            return Outcome::error(format!("cannot redefine constant \"{}\"", name));
        }
        Outcome::default()
    }

    fn check_local(&self, name: &str) -> Outcome {
        if self.locals.borrow().contains_key(name) {
            return Outcome::error(format!("cannot redefine local \"{}\"", name));
        }
        Outcome::default()
    }

    pub fn set_named_constant(&self, name: &str, value: Value) -> Outcome {
        let result = self.check_constant(name);
        if !result.is_ok() {
            return result;
        }
        self.context
            .constants
            .borrow_mut()
            .insert(name.to_string(), value.clone());
        Outcome::ok(value)
    }

    pub fn set_named_variable(&self, name: &str, value: Value) -> Outcome {
        let result = self.check_variable(name);
        if !result.is_ok() {
            return result;
        }
        self.context
            .variables
            .borrow_mut()
            .insert(name.to_string(), value.clone());
        Outcome::ok(value)
    }

    pub fn set_named_local(&self, name: &str, value: Value) -> Outcome {
        let result = self.check_local(name);
        if !result.is_ok() {
            return result;
        }
        self.locals
            .borrow_mut()
            .insert(name.to_string(), value.clone());
        Outcome::ok(value)
    }

    pub fn get_variable(&self, name: &str) -> OutcomeResult<Value> {
        self.resolve_variable(name)
            .ok_or_else(|| Outcome::error(format!("cannot get \"{}\": no such variable", name)))
    }

    /// Locals are never cleared implicitly; loops call this before every round
    pub fn clear_locals(&self) {
        self.locals.borrow_mut().clear();
    }

    /* ===================== Destructuring ===================== */

    pub fn destructure_constant(&self, shape: &Value, value: &Value) -> Outcome {
        destructure_value(
            &mut |name: &str, value: &Value, check: bool| {
                if check {
                    self.check_constant(name)
                } else {
                    self.set_named_constant(name, value.clone())
                }
            },
            shape,
            value,
        )
    }

    pub fn destructure_variable(&self, shape: &Value, value: &Value) -> Outcome {
        destructure_value(
            &mut |name: &str, value: &Value, check: bool| {
                if check {
                    self.check_variable(name)
                } else {
                    self.set_named_variable(name, value.clone())
                }
            },
            shape,
            value,
        )
    }

    pub fn destructure_local(&self, shape: &Value, value: &Value) -> Outcome {
        destructure_value(
            &mut |name: &str, value: &Value, check: bool| {
                if check {
                    self.check_local(name)
                } else {
                    self.set_named_local(name, value.clone())
                }
            },
            shape,
            value,
        )
    }
}

/// Bind every leaf of `shape` to the matching part of `value`
///
/// Runs a full dry pass first (`check = true`); nothing is bound unless every
/// level matches and every name is assignable.
pub fn destructure_value(
    apply: &mut dyn FnMut(&str, &Value, bool) -> Outcome,
    shape: &Value,
    value: &Value,
) -> Outcome {
    let result = destructure_pass(apply, shape, value, true);
    if !result.is_ok() {
        return result;
    }
    let result = destructure_pass(apply, shape, value, false);
    if !result.is_ok() {
        return result;
    }
    Outcome::ok(value.clone())
}

fn destructure_pass(
    apply: &mut dyn FnMut(&str, &Value, bool) -> Outcome,
    shape: &Value,
    value: &Value,
    check: bool,
) -> Outcome {
    match shape {
        Value::Tuple(shapes) => {
            let Some(values) = value.as_tuple() else {
                return Outcome::error("bad value shape");
            };
            if shapes.len() != values.len() {
                return Outcome::error("bad value shape");
            }
            for (shape, value) in shapes.iter().zip(values) {
                let result = destructure_pass(apply, shape, value, check);
                if !result.is_ok() {
                    return result;
                }
            }
            Outcome::default()
        }
        other => match other.as_text() {
            Ok(name) => apply(&name, value, check),
            Err(_) => Outcome::error("invalid variable name"),
        },
    }
}
