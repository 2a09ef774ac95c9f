//! Opcode executor
//!
//! Runs a [`Program`] against a resumable [`ProgramState`]. Execution stops at
//! the first non-OK command result; a YIELD is kept pending in the state so
//! that the next call can route the resumed value back to the command that
//! suspended.

use std::rc::Rc;

use super::commands::Command;
use super::compiler::{OpCode, Program};
use super::pool::{Pool, Recycle};
use super::scope::ScopeRef;
use super::types::ast::SourcePosition;
use super::types::control::{Outcome, OutcomeResult, ResultCode};
use super::types::values::Value;

/* ===================== Program State ===================== */

/// Resumable execution state of one program
#[derive(Default)]
pub struct ProgramState {
    ip: usize,
    stack: Vec<Value>,
    frames: Vec<usize>,
    /// Result injected before the next run, or the pending YIELD
    result: Option<Outcome>,
    last_result: Value,
    last_command: Option<Rc<dyn Command>>,
    last_frame: Option<Rc<Vec<Value>>>,
    last_position: Option<SourcePosition>,
}

impl ProgramState {
    /// Inject a result to be consumed by the next run
    pub fn set_result(&mut self, result: Outcome) {
        self.result = Some(result);
    }

    /// Overwrite the value of the pending result, if any
    pub fn yield_back(&mut self, value: Value) {
        if let Some(result) = &mut self.result {
            result.value = value;
        }
    }

    pub fn pending(&self) -> Option<&Outcome> {
        self.result.as_ref()
    }

    /// Words of the last evaluated sentence
    pub fn last_frame(&self) -> Option<&Rc<Vec<Value>>> {
        self.last_frame.as_ref()
    }

    pub fn last_position(&self) -> Option<SourcePosition> {
        self.last_position
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().unwrap_or_default()
    }
}

impl Recycle for ProgramState {
    fn recycle(&mut self) {
        self.ip = 0;
        self.stack.clear();
        self.frames.clear();
        self.result = None;
        self.last_result = Value::Nil;
        self.last_command = None;
        self.last_frame = None;
        self.last_position = None;
    }
}

thread_local! {
    pub(crate) static PROGRAM_STATES: Pool<ProgramState> = const { Pool::new() };
}

/* ===================== Executor ===================== */

pub struct Executor<'a> {
    scope: &'a ScopeRef,
}

impl<'a> Executor<'a> {
    pub fn new(scope: &'a ScopeRef) -> Self {
        Self { scope }
    }

    pub fn execute(&self, program: &Program, state: &mut ProgramState) -> Outcome {
        if let Some(pending) = state.result.take() {
            match pending.code {
                ResultCode::Yield => {
                    let result = match state.last_command.clone() {
                        Some(command) => command.resume(pending, self.scope),
                        None => Outcome::ok(pending.value),
                    };
                    if let Some(stop) = self.accept(state, result) {
                        return stop;
                    }
                }
                ResultCode::Ok => state.last_result = pending.value,
                _ => return pending,
            }
        }

        while state.ip < program.opcodes.len() {
            let opcode = program.opcodes[state.ip];
            state.ip += 1;
            match opcode {
                OpCode::PushNil => state.stack.push(Value::Nil),
                OpCode::PushConstant(index) => {
                    let value = program.constants.get(index).cloned().unwrap_or_default();
                    state.stack.push(value);
                }
                OpCode::OpenFrame => state.frames.push(state.stack.len()),
                OpCode::CloseFrame => {
                    let start = state.frames.pop().unwrap_or(0).min(state.stack.len());
                    let items = state.stack.split_off(start);
                    state.stack.push(Value::tuple(items));
                }
                OpCode::ResolveValue => {
                    let source = state.pop();
                    match self.resolve_value(&source) {
                        Ok(value) => state.stack.push(value),
                        Err(error) => return error,
                    }
                }
                OpCode::EvaluateSentence(position) => {
                    let Value::Tuple(words) = state.pop() else {
                        continue;
                    };
                    state.last_position = position.and_then(|i| program.positions.get(i).copied());
                    state.last_frame = Some(words.clone());
                    let Some(name) = words.first() else {
                        state.last_result = Value::Nil;
                        continue;
                    };
                    let command = match self.scope.resolve_command(name) {
                        Ok(command) => command,
                        Err(error) => return error,
                    };
                    let result = command.execute(&words, self.scope);
                    state.last_command = Some(command);
                    if let Some(stop) = self.accept(state, result) {
                        return stop;
                    }
                }
                OpCode::PushResult => state.stack.push(state.last_result.clone()),
                OpCode::JoinStrings => {
                    let parts = state.pop();
                    match join_strings(&parts) {
                        Ok(joined) => state.stack.push(Value::from(joined)),
                        Err(error) => return error,
                    }
                }
            }
        }

        Outcome::ok(state.last_result.clone())
    }

    /// Record a command result; returns the outcome that stops execution, if any
    fn accept(&self, state: &mut ProgramState, result: Outcome) -> Option<Outcome> {
        match result.code {
            ResultCode::Ok => {
                state.last_result = result.value;
                None
            }
            ResultCode::Yield => {
                state.result = Some(result.clone());
                Some(result)
            }
            _ => Some(result),
        }
    }

    fn resolve_value(&self, source: &Value) -> OutcomeResult<Value> {
        match source {
            Value::Tuple(items) => items
                .iter()
                .map(|item| self.resolve_value(item))
                .collect::<OutcomeResult<Vec<_>>>()
                .map(Value::tuple),
            other => {
                let name = other.as_text()?;
                self.scope
                    .resolve_variable(&name)
                    .ok_or_else(|| Outcome::error(format!("cannot resolve variable \"{}\"", name)))
            }
        }
    }
}

fn join_strings(parts: &Value) -> OutcomeResult<String> {
    let mut joined = String::new();
    for part in parts.as_tuple().unwrap_or_default() {
        joined.push_str(&part.as_text()?);
    }
    Ok(joined)
}
