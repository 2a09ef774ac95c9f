//! Exception-style handling: catch, with pass support
//!
//! The body, the matching handler and `finally` each run in their own nested
//! [`Process`]. A YIELD from any of them suspends `catch` itself; the pooled
//! state travels in the YIELD's token and `resume` feeds the supplied value
//! back into the nested process of the current phase.

use std::cell::RefCell;
use std::rc::Rc;

use super::{body_program, wrong_args, Command};
use crate::interpreter::compiler::Program;
use crate::interpreter::pool::{Pool, Pooled, Recycle};
use crate::interpreter::process::Process;
use crate::interpreter::scope::ScopeRef;
use crate::interpreter::types::control::{Outcome, OutcomeResult, ResultCode, PASS};
use crate::interpreter::types::phase::CatchPhase;
use crate::interpreter::types::values::Value;

const USAGE: &str = "catch body ?return value handler? ?yield value handler? ?error message handler? ?break handler? ?continue handler? ?finally handler?";

pub fn register(scope: &ScopeRef) {
    scope.register_named_command("catch", Rc::new(CatchCommand));
}

/* ===================== State ===================== */

struct Clause {
    code: ResultCode,
    param: Option<Value>,
    handler: Rc<Program>,
}

#[derive(Default)]
struct CatchState {
    scope: Option<ScopeRef>,
    clauses: Vec<Clause>,
    finally: Option<Rc<Program>>,
    /// No clause at all: the result is described as a tuple
    bare: bool,
    phase: CatchPhase,
    /// Nested process of the current phase
    process: Option<Process>,
    /// Body suspended while its yield handler runs
    body: Option<Process>,
    /// Code whose handler is running
    handled: Option<ResultCode>,
    /// Result carried to `pass` and `finally`
    outcome: Outcome,
}

impl CatchState {
    fn scope(&self) -> ScopeRef {
        match &self.scope {
            Some(scope) => scope.clone(),
            None => unreachable!("catch state without scope"),
        }
    }

    fn clause(&self, code: ResultCode) -> Option<usize> {
        self.clauses.iter().position(|clause| clause.code == code)
    }
}

impl Recycle for CatchState {
    fn recycle(&mut self) {
        self.scope = None;
        self.clauses.clear();
        self.finally = None;
        self.bare = false;
        self.phase = CatchPhase::default();
        self.process = None;
        self.body = None;
        self.handled = None;
        self.outcome = Outcome::default();
    }
}

thread_local! {
    static CATCH_STATES: Pool<CatchState> = const { Pool::new() };
}

/// Resumption token: the suspended state, taken exactly once
struct CatchToken(RefCell<Option<Pooled<CatchState>>>);

/* ===================== Command ===================== */

struct CatchCommand;

impl Command for CatchCommand {
    fn execute(&self, args: &[Value], scope: &ScopeRef) -> Outcome {
        let [_, body, clauses @ ..] = args else {
            return wrong_args(USAGE);
        };
        let body = match body_program(body) {
            Ok(body) => body,
            Err(error) => return error,
        };
        let mut state = Pooled::acquire(&CATCH_STATES);
        if let Err(error) = parse_clauses(&mut state, clauses) {
            return error;
        }
        state.bare = clauses.is_empty();
        state.scope = Some(scope.clone());
        state.phase = CatchPhase::InBody;
        state.process = Some(scope.prepare_process(body));
        run(state)
    }

    fn resume(&self, result: Outcome, _scope: &ScopeRef) -> Outcome {
        let state = result
            .token()
            .and_then(|token| token.downcast_ref::<CatchToken>())
            .and_then(|token| token.0.borrow_mut().take());
        let Some(mut state) = state else {
            return Outcome::error("catch resumed without suspended state");
        };
        if let Some(process) = state.process.as_mut() {
            process.yield_back(result.value.clone());
        }
        run(state)
    }
}

fn parse_clauses(state: &mut CatchState, clauses: &[Value]) -> OutcomeResult<()> {
    let mut rest = clauses;
    while let [keyword, tail @ ..] = rest {
        let keyword = keyword.as_text().unwrap_or_default();
        let code = match keyword.as_str() {
            "return" => Some(ResultCode::Return),
            "yield" => Some(ResultCode::Yield),
            "error" => Some(ResultCode::Error),
            _ => None,
        };
        rest = match (keyword.as_str(), tail) {
            ("return" | "yield" | "error", [param, handler, tail @ ..]) => {
                state.clauses.push(Clause {
                    code: code.unwrap_or(ResultCode::Error),
                    param: Some(param.clone()),
                    handler: body_program(handler)?,
                });
                tail
            }
            ("break" | "continue", [handler, tail @ ..]) => {
                let code = if keyword == "break" {
                    ResultCode::Break
                } else {
                    ResultCode::Continue
                };
                state.clauses.push(Clause {
                    code,
                    param: None,
                    handler: body_program(handler)?,
                });
                tail
            }
            ("finally", [handler, tail @ ..]) => {
                state.finally = Some(body_program(handler)?);
                tail
            }
            ("return" | "yield" | "error" | "break" | "continue" | "finally", _) => {
                return Err(wrong_args(USAGE))
            }
            (other, _) => return Err(Outcome::error(format!("invalid keyword \"{}\"", other))),
        };
    }
    Ok(())
}

/* ===================== State Machine ===================== */

fn run(mut state: Pooled<CatchState>) -> Outcome {
    loop {
        let result = match state.process.as_mut() {
            Some(process) => process.run(),
            None => unreachable!("catch state without process"),
        };
        let phase = state.phase;

        if result.code == ResultCode::Yield {
            if phase == CatchPhase::InBody {
                if let Some(index) = state.clause(ResultCode::Yield) {
                    state.body = state.process.take();
                    state.outcome = result.clone();
                    if let Err(error) = start_handler(&mut state, index, &result.value) {
                        return error;
                    }
                    continue;
                }
            }
            return suspend(state, result.value);
        }

        match phase {
            CatchPhase::InBody => {
                if state.bare {
                    return Outcome::ok(describe(&result));
                }
                match state.clause(result.code) {
                    Some(index) => {
                        state.outcome = result.clone();
                        if let Err(error) = start_handler(&mut state, index, &result.value) {
                            return error;
                        }
                    }
                    None => {
                        if let Some(outcome) = enter_finally(&mut state, result) {
                            return outcome;
                        }
                    }
                }
            }
            CatchPhase::InHandler => {
                let from_yield = state.handled == Some(ResultCode::Yield);
                let outcome = if result.code == ResultCode::Custom(&PASS) {
                    if from_yield {
                        // Let the body's yield escape; resuming feeds the body
                        state.process = state.body.take();
                        state.phase = CatchPhase::InBody;
                        state.handled = None;
                        let value = state.outcome.value.clone();
                        return suspend(state, value);
                    }
                    state.outcome.clone()
                } else if from_yield && result.is_ok() {
                    // The handler's value is what the body's yield resumes with
                    let mut body = state.body.take();
                    if let Some(body) = body.as_mut() {
                        body.yield_back(result.value);
                    }
                    state.process = body;
                    state.phase = CatchPhase::InBody;
                    state.handled = None;
                    continue;
                } else {
                    result
                };
                if let Some(outcome) = enter_finally(&mut state, outcome) {
                    return outcome;
                }
            }
            CatchPhase::InFinally => {
                return if result.is_ok() {
                    state.outcome.clone()
                } else {
                    result
                };
            }
        }
    }
}

/// Value-bearing handlers get a local scope with their parameter bound
fn start_handler(state: &mut CatchState, index: usize, value: &Value) -> OutcomeResult<()> {
    let scope = state.scope();
    let clause = &state.clauses[index];
    let handler_scope = match &clause.param {
        Some(param) => {
            let local = scope.new_local_scope();
            let bound = local.destructure_local(param, value);
            if !bound.is_ok() {
                return Err(bound);
            }
            local
        }
        None => scope,
    };
    let process = handler_scope.prepare_process(clause.handler.clone());
    state.handled = Some(clause.code);
    state.process = Some(process);
    state.phase = CatchPhase::InHandler;
    Ok(())
}

/// Switch to `finally` if there is one; otherwise `outcome` is final
fn enter_finally(state: &mut CatchState, outcome: Outcome) -> Option<Outcome> {
    let Some(finally) = state.finally.clone() else {
        return Some(outcome);
    };
    state.outcome = outcome;
    state.process = Some(state.scope().prepare_process(finally));
    state.phase = CatchPhase::InFinally;
    None
}

fn suspend(state: Pooled<CatchState>, value: Value) -> Outcome {
    Outcome::yield_with(value, Rc::new(CatchToken(RefCell::new(Some(state)))))
}

/// `(code value)`, or `(code)` for loop codes
fn describe(result: &Outcome) -> Value {
    let code = Value::from(result.code.name());
    match result.code {
        ResultCode::Break | ResultCode::Continue => Value::tuple(vec![code]),
        _ => Value::tuple(vec![code, result.value.clone()]),
    }
}
