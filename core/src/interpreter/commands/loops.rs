//! Loop commands: while, loop
//!
//! Each invocation owns one pooled state record and advances it from
//! continuation callbacks, so tests, sources and bodies can all yield.

use std::rc::Rc;

use super::{body_program, wrong_args, NativeCommand};
use crate::interpreter::compiler::{Compiler, Program};
use crate::interpreter::pool::{Pool, Pooled, Recycle};
use crate::interpreter::process::yield_continuation_with_data;
use crate::interpreter::scope::ScopeRef;
use crate::interpreter::types::control::{Outcome, OutcomeResult, ResultCode};
use crate::interpreter::types::phase::{LoopPhase, WhilePhase};
use crate::interpreter::types::values::Value;

pub fn register(scope: &ScopeRef) {
    scope.register_named_command("while", Rc::new(NativeCommand(while_)));
    scope.register_named_command("loop", Rc::new(NativeCommand(loop_)));
}

/* ===================== while ===================== */

#[derive(Default)]
struct WhileState {
    scope: Option<ScopeRef>,
    /// `None` when the test is a literal; see `literal`
    test: Option<Rc<Program>>,
    literal: bool,
    body: Option<Rc<Program>>,
    phase: WhilePhase,
    result: Value,
}

impl WhileState {
    fn scope(&self) -> ScopeRef {
        match &self.scope {
            Some(scope) => scope.clone(),
            None => unreachable!("while state without scope"),
        }
    }

    fn body(&self) -> Rc<Program> {
        match &self.body {
            Some(body) => body.clone(),
            None => unreachable!("while state without body"),
        }
    }
}

impl Recycle for WhileState {
    fn recycle(&mut self) {
        self.scope = None;
        self.test = None;
        self.literal = false;
        self.body = None;
        self.phase = WhilePhase::default();
        self.result = Value::Nil;
    }
}

thread_local! {
    static WHILE_STATES: Pool<WhileState> = const { Pool::new() };
}

fn while_(args: &[Value], scope: &ScopeRef) -> Outcome {
    let [_, test, body] = args else {
        return wrong_args("while test body");
    };
    let body = match body_program(body) {
        Ok(body) => body,
        Err(error) => return error,
    };
    let mut state = Pooled::acquire(&WHILE_STATES);
    match test {
        Value::Script(script) => state.test = Some(script.program()),
        other => match other.as_bool() {
            Ok(literal) => state.literal = literal,
            Err(error) => return error,
        },
    }
    state.body = Some(body);
    state.scope = Some(scope.clone());
    run_test(state)
}

fn run_test(mut state: Pooled<WhileState>) -> Outcome {
    let scope = state.scope();
    match state.test.clone() {
        Some(test) => {
            state.phase = WhilePhase::InTest;
            yield_continuation_with_data(&scope, test, state, while_step)
        }
        None if state.literal => run_body(state),
        None => Outcome::ok(state.result.clone()),
    }
}

fn run_body(mut state: Pooled<WhileState>) -> Outcome {
    let scope = state.scope();
    let body = state.body();
    state.phase = WhilePhase::InBody;
    yield_continuation_with_data(&scope, body, state, while_step)
}

fn while_step(result: Outcome, mut state: Pooled<WhileState>) -> Outcome {
    let phase = state.phase;
    match phase {
        WhilePhase::InTest => {
            if !result.is_ok() {
                return result;
            }
            match result.value.as_bool() {
                Ok(true) => run_body(state),
                Ok(false) => Outcome::ok(state.result.clone()),
                Err(error) => error,
            }
        }
        WhilePhase::InBody => match result.code {
            ResultCode::Ok => {
                state.result = result.value;
                run_test(state)
            }
            ResultCode::Break => Outcome::ok(Value::Nil),
            ResultCode::Continue => run_test(state),
            _ => result,
        },
    }
}

/* ===================== loop ===================== */

const LOOP_USAGE: &str = "loop ?index? ?value source ...? body";

enum SourceKind {
    Items { items: Rc<Vec<Value>>, next: usize },
    Script(Rc<Program>),
    Command(Vec<Value>),
}

struct Source {
    shape: Value,
    kind: SourceKind,
    retired: bool,
}

impl Source {
    fn new(shape: &Value, source: &Value) -> OutcomeResult<Self> {
        let kind = match source {
            Value::List(items) => SourceKind::Items {
                items: items.clone(),
                next: 0,
            },
            Value::Dict(entries) => SourceKind::Items {
                items: Rc::new(
                    entries
                        .iter()
                        .map(|(key, value)| {
                            Value::tuple(vec![Value::from(key.as_str()), value.clone()])
                        })
                        .collect(),
                ),
                next: 0,
            },
            Value::Script(script) => SourceKind::Script(script.program()),
            Value::Tuple(prefix) if !prefix.is_empty() => SourceKind::Command(prefix.to_vec()),
            other if other.as_text().is_ok() => SourceKind::Command(vec![other.clone()]),
            _ => return Err(Outcome::error("invalid source")),
        };
        Ok(Self {
            shape: shape.clone(),
            kind,
            retired: false,
        })
    }
}

#[derive(Default)]
struct LoopState {
    scope: Option<ScopeRef>,
    index: Option<String>,
    sources: Vec<Source>,
    body: Option<Rc<Program>>,
    round: i64,
    /// Source visited in the current round
    cursor: usize,
    phase: LoopPhase,
    result: Value,
}

impl LoopState {
    fn scope(&self) -> ScopeRef {
        match &self.scope {
            Some(scope) => scope.clone(),
            None => unreachable!("loop state without scope"),
        }
    }

    fn body(&self) -> Rc<Program> {
        match &self.body {
            Some(body) => body.clone(),
            None => unreachable!("loop state without body"),
        }
    }
}

impl Recycle for LoopState {
    fn recycle(&mut self) {
        self.scope = None;
        self.index = None;
        self.sources.clear();
        self.body = None;
        self.round = 0;
        self.cursor = 0;
        self.phase = LoopPhase::default();
        self.result = Value::Nil;
    }
}

thread_local! {
    static LOOP_STATES: Pool<LoopState> = const { Pool::new() };
}

fn loop_(args: &[Value], scope: &ScopeRef) -> Outcome {
    let [_, middle @ .., body] = args else {
        return wrong_args(LOOP_USAGE);
    };
    let mut state = Pooled::acquire(&LOOP_STATES);
    if let Err(error) = parse_loop(&mut state, middle, body) {
        return error;
    }
    state.scope = Some(scope.new_local_scope());
    start_round(state)
}

fn parse_loop(state: &mut LoopState, middle: &[Value], body: &Value) -> OutcomeResult<()> {
    let pairs = if middle.len() % 2 == 1 {
        let index = middle[0]
            .as_text()
            .map_err(|_| Outcome::error("invalid index name"))?;
        state.index = Some(index);
        &middle[1..]
    } else {
        middle
    };
    for pair in pairs.chunks_exact(2) {
        state.sources.push(Source::new(&pair[0], &pair[1])?);
    }
    state.body = Some(body_program(body)?);
    Ok(())
}

/// Locals are cleared and the index rebound before any source runs
fn start_round(mut state: Pooled<LoopState>) -> Outcome {
    let scope = state.scope();
    scope.clear_locals();
    if let Some(index) = &state.index {
        let result = scope.set_named_local(index, Value::Integer(state.round));
        if !result.is_ok() {
            return result;
        }
    }
    state.cursor = 0;
    next_source(state)
}

fn next_source(mut state: Pooled<LoopState>) -> Outcome {
    let scope = state.scope();
    while state.cursor < state.sources.len() {
        let round = state.round;
        let cursor = state.cursor;
        let source = &mut state.sources[cursor];
        if source.retired {
            state.cursor += 1;
            continue;
        }
        let program = match &mut source.kind {
            SourceKind::Items { items, next } => {
                if let Some(value) = items.get(*next).cloned() {
                    *next += 1;
                    let result = scope.destructure_local(&source.shape, &value);
                    if !result.is_ok() {
                        return result;
                    }
                } else {
                    source.retired = true;
                }
                state.cursor += 1;
                continue;
            }
            SourceKind::Script(program) => program.clone(),
            SourceKind::Command(prefix) => {
                let mut words = prefix.clone();
                words.push(Value::Integer(round));
                Rc::new(Compiler::compile_sentence(&words))
            }
        };
        state.phase = LoopPhase::InSource;
        return yield_continuation_with_data(&scope, program, state, loop_step);
    }

    if !state.sources.is_empty() && state.sources.iter().all(|source| source.retired) {
        return Outcome::ok(state.result.clone());
    }
    let body = state.body();
    state.phase = LoopPhase::InBody;
    yield_continuation_with_data(&scope, body, state, loop_step)
}

fn loop_step(result: Outcome, mut state: Pooled<LoopState>) -> Outcome {
    let phase = state.phase;
    match phase {
        LoopPhase::InSource => {
            let scope = state.scope();
            let cursor = state.cursor;
            state.cursor += 1;
            let source = &mut state.sources[cursor];
            match result.code {
                ResultCode::Ok => {
                    let bound = scope.destructure_local(&source.shape, &result.value);
                    if !bound.is_ok() {
                        return bound;
                    }
                }
                ResultCode::Break => source.retired = true,
                ResultCode::Continue => {}
                _ => return result,
            }
            next_source(state)
        }
        LoopPhase::InBody => match result.code {
            ResultCode::Ok => {
                state.result = result.value;
                state.round += 1;
                start_round(state)
            }
            ResultCode::Break => Outcome::ok(state.result.clone()),
            ResultCode::Continue => {
                state.round += 1;
                start_round(state)
            }
            _ => result,
        },
    }
}
