//! Process trampoline
//!
//! A [`Process`] drives nested, suspendable command invocations with an
//! explicit [`ProcessStack`] instead of the host call stack. Commands never
//! run nested programs themselves: they return a YIELD whose value is a
//! [`ContinuationValue`], and the process pushes a new activation context for
//! it. When that context settles, its callback (if any) decides what the
//! issuing command produces.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use super::compiler::Program;
use super::executor::{ProgramState, PROGRAM_STATES};
use super::pool::Pooled;
use super::scope::ScopeRef;
use super::types::control::{Outcome, ResultCode, ResultData};
use super::types::error_stack::{ErrorFrame, ErrorStack};
use super::types::values::Value;

/* ===================== Continuations ===================== */

/// Receives the terminal result of a continuation's program
pub type Callback = Box<dyn FnOnce(Outcome) -> Outcome>;

/// Request to run `program` in `scope`, then pass its result to `callback`
pub struct ContinuationValue {
    pub scope: ScopeRef,
    pub program: Rc<Program>,
    callback: RefCell<Option<Callback>>,
    consumed: Cell<bool>,
}

impl ContinuationValue {
    pub fn new(scope: ScopeRef, program: Rc<Program>) -> Self {
        Self {
            scope,
            program,
            callback: RefCell::new(None),
            consumed: Cell::new(false),
        }
    }

    pub fn with_callback(scope: ScopeRef, program: Rc<Program>, callback: Callback) -> Self {
        Self {
            scope,
            program,
            callback: RefCell::new(Some(callback)),
            consumed: Cell::new(false),
        }
    }

    /// Callback that also receives caller-supplied data
    pub fn with_data<T: 'static>(
        scope: ScopeRef,
        program: Rc<Program>,
        data: T,
        callback: impl FnOnce(Outcome, T) -> Outcome + 'static,
    ) -> Self {
        Self::with_callback(scope, program, Box::new(move |result| callback(result, data)))
    }

    fn has_callback(&self) -> bool {
        self.callback.borrow().is_some()
    }

    fn take_callback(&self) -> Option<Callback> {
        self.callback.borrow_mut().take()
    }
}

impl fmt::Debug for ContinuationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuationValue")
            .field("callback", &self.has_callback())
            .finish_non_exhaustive()
    }
}

/// YIELD asking the trampoline to run `program` in `scope`
pub fn yield_continuation(scope: &ScopeRef, program: Rc<Program>) -> Outcome {
    continuation_outcome(ContinuationValue::new(scope.clone(), program))
}

/// YIELD asking the trampoline to run `program`, then `callback` on its result
pub fn yield_continuation_with(
    scope: &ScopeRef,
    program: Rc<Program>,
    callback: impl FnOnce(Outcome) -> Outcome + 'static,
) -> Outcome {
    continuation_outcome(ContinuationValue::with_callback(
        scope.clone(),
        program,
        Box::new(callback),
    ))
}

/// Like [`yield_continuation_with`], threading `data` through to the callback
pub fn yield_continuation_with_data<T: 'static>(
    scope: &ScopeRef,
    program: Rc<Program>,
    data: T,
    callback: impl FnOnce(Outcome, T) -> Outcome + 'static,
) -> Outcome {
    continuation_outcome(ContinuationValue::with_data(
        scope.clone(),
        program,
        data,
        callback,
    ))
}

fn continuation_outcome(continuation: ContinuationValue) -> Outcome {
    Outcome::yield_(Value::Continuation(Rc::new(continuation)))
}

/* ===================== Process Stack ===================== */

/// One level of the explicit call stack
pub struct ActivationContext {
    scope: ScopeRef,
    program: Rc<Program>,
    state: Pooled<ProgramState>,
    callback: Option<Callback>,
    /// Program stopped on a non-YIELD continuation whose result stands for its own
    delegated: bool,
    /// Callback already applied; the stored result is final
    settled: bool,
}

impl ActivationContext {
    fn new(scope: ScopeRef, program: Rc<Program>, callback: Option<Callback>) -> Self {
        Self {
            scope,
            program,
            state: Pooled::acquire(&PROGRAM_STATES),
            callback,
            delegated: false,
            settled: false,
        }
    }

    fn from_continuation(continuation: &ContinuationValue) -> Self {
        debug_assert!(
            !continuation.consumed.replace(true),
            "continuation consumed twice"
        );
        Self::new(
            continuation.scope.clone(),
            continuation.program.clone(),
            continuation.take_callback(),
        )
    }

    fn execute(&mut self) -> Outcome {
        if self.settled {
            self.settled = false;
            return match self.state.pending().cloned() {
                Some(result) => Outcome::ok(result.value),
                None => Outcome::default(),
            };
        }
        self.scope.execute(&self.program, &mut self.state)
    }

    /// Frame describing where this context stopped
    fn error_frame(&self) -> ErrorFrame {
        ErrorFrame {
            frame: self
                .state
                .last_frame()
                .map(|words| words.to_vec())
                .unwrap_or_default(),
            source: self.program.source().map(|s| s.to_string()),
            position: self.state.last_position(),
        }
    }
}

/// Ordered stack of activation contexts; the last one is current
#[derive(Default)]
pub struct ProcessStack {
    contexts: Vec<ActivationContext>,
}

impl ProcessStack {
    pub fn depth(&self) -> usize {
        self.contexts.len()
    }

    fn push(&mut self, context: ActivationContext) {
        trace!(depth = self.contexts.len() + 1, "push context");
        self.contexts.push(context);
    }

    fn pop(&mut self) -> Option<ActivationContext> {
        trace!(depth = self.contexts.len(), "pop context");
        self.contexts.pop()
    }

    fn current(&mut self) -> Option<&mut ActivationContext> {
        self.contexts.last_mut()
    }
}

/* ===================== Process ===================== */

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOptions {
    /// Attach an error stack to ERROR results
    pub capture_error_stack: bool,
}

/// Trampoline driver for one program
pub struct Process {
    stack: ProcessStack,
    options: ProcessOptions,
}

impl Process {
    pub fn new(scope: ScopeRef, program: Rc<Program>, options: ProcessOptions) -> Self {
        let mut stack = ProcessStack::default();
        stack.push(ActivationContext::new(scope, program, None));
        Self { stack, options }
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Supply the value a suspended `yield` resumes with
    pub fn yield_back(&mut self, value: Value) {
        if let Some(context) = self.stack.current() {
            context.state.yield_back(value);
        }
    }

    /// Inject the result of a side invocation into the current context
    pub fn set_result(&mut self, result: Outcome) {
        if let Some(context) = self.stack.current() {
            context.state.set_result(result);
        }
    }

    /// Run until a YIELD escapes or the bottom context settles
    pub fn run(&mut self) -> Outcome {
        let mut result = match self.stack.current() {
            Some(context) => context.execute(),
            None => return Outcome::default(),
        };

        loop {
            // Nested program requested by the current context
            if let Some(continuation) = result.continuation() {
                if result.code != ResultCode::Yield {
                    let has_callback = self
                        .stack
                        .current()
                        .map(|context| context.callback.is_some())
                        .unwrap_or(false);
                    if has_callback {
                        if let Some(context) = self.stack.current() {
                            context.delegated = true;
                        }
                    } else {
                        debug!("tail call: replacing current context");
                        self.stack.pop();
                    }
                }
                self.stack
                    .push(ActivationContext::from_continuation(&continuation));
                result = self.execute_current();
                continue;
            }

            if result.code == ResultCode::Yield {
                trace!("suspended");
                return result;
            }

            result = self.settle(result);

            // The callback asked for another step
            if let Some(continuation) = result.continuation() {
                trace!("chaining continuation");
                self.stack.pop();
                self.stack
                    .push(ActivationContext::from_continuation(&continuation));
                result = self.execute_current();
                continue;
            }

            if self.stack.depth() <= 1 {
                if result.code == ResultCode::Yield {
                    if let Some(context) = self.stack.current() {
                        context.state.set_result(result.clone());
                        context.settled = true;
                    }
                }
                return result;
            }

            self.stack.pop();
            let Some(caller) = self.stack.current() else {
                return result;
            };
            if caller.delegated {
                caller.delegated = false;
                continue;
            }
            match result.code {
                ResultCode::Yield => {
                    caller.state.set_result(result.clone());
                    return result;
                }
                ResultCode::Ok => {
                    caller.state.set_result(result);
                    result = caller.execute();
                }
                // Unwinding: the caller stops on this result too
                _ => {}
            }
        }
    }

    fn execute_current(&mut self) -> Outcome {
        match self.stack.current() {
            Some(context) => context.execute(),
            None => Outcome::default(),
        }
    }

    /// Apply the current context's callback and error-stack bookkeeping
    fn settle(&mut self, mut result: Outcome) -> Outcome {
        let capture = self.options.capture_error_stack;
        let Some(context) = self.stack.current() else {
            return result;
        };
        if let Some(callback) = context.callback.take() {
            result = callback(result);
        }
        if result.code == ResultCode::Error {
            if capture {
                let mut stack = match result.data.take() {
                    Some(ResultData::ErrorStack(stack)) => stack,
                    _ => Rc::new(ErrorStack::new()),
                };
                Rc::make_mut(&mut stack).push(context.error_frame());
                result.data = Some(ResultData::ErrorStack(stack));
            } else {
                result.data = None;
            }
        }
        result
    }
}
