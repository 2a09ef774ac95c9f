//! Conditional commands: if, when
//!
//! Both walk a list of tests left to right and run the body of the first one
//! that holds. Script tests are evaluated through the trampoline, so a test or
//! a body may yield at any point.

use std::rc::Rc;

use super::{body_program, wrong_args, NativeCommand};
use crate::interpreter::compiler::{Compiler, Program};
use crate::interpreter::pool::{Pool, Pooled, Recycle};
use crate::interpreter::process::{yield_continuation, yield_continuation_with_data};
use crate::interpreter::scope::ScopeRef;
use crate::interpreter::types::ast::{Morpheme, Word};
use crate::interpreter::types::control::{Outcome, OutcomeResult};
use crate::interpreter::types::phase::WhenPhase;
use crate::interpreter::types::values::{ScriptValue, Value};

pub fn register(scope: &ScopeRef) {
    scope.register_named_command("if", Rc::new(NativeCommand(if_)));
    scope.register_named_command("when", Rc::new(NativeCommand(when)));
}

/// Test value: a script is evaluated, anything else is coerced directly
enum Test {
    Script(Rc<Program>),
    Literal(Value),
}

impl Test {
    fn new(value: &Value) -> Self {
        match value {
            Value::Script(script) => Test::Script(script.program()),
            other => Test::Literal(other.clone()),
        }
    }
}

/* ===================== if ===================== */

const IF_USAGE: &str = "if test body ?elseif test body ...? ?else body?";

#[derive(Default)]
struct IfState {
    scope: Option<ScopeRef>,
    branches: Vec<(Test, Rc<Program>)>,
    otherwise: Option<Rc<Program>>,
    index: usize,
}

impl IfState {
    fn scope(&self) -> ScopeRef {
        match &self.scope {
            Some(scope) => scope.clone(),
            None => unreachable!("if state without scope"),
        }
    }
}

impl Recycle for IfState {
    fn recycle(&mut self) {
        self.scope = None;
        self.branches.clear();
        self.otherwise = None;
        self.index = 0;
    }
}

thread_local! {
    static IF_STATES: Pool<IfState> = const { Pool::new() };
}

fn if_(args: &[Value], scope: &ScopeRef) -> Outcome {
    let mut state = Pooled::acquire(&IF_STATES);
    if let Err(error) = parse_if(&mut state, args) {
        return error;
    }
    state.scope = Some(scope.clone());
    next_branch(state)
}

fn parse_if(state: &mut IfState, args: &[Value]) -> OutcomeResult<()> {
    let [_, test, body, rest @ ..] = args else {
        return Err(wrong_args(IF_USAGE));
    };
    state.branches.push((Test::new(test), body_program(body)?));
    let mut rest = rest;
    loop {
        match rest {
            [] => return Ok(()),
            [keyword, tail @ ..] => {
                let keyword = keyword.as_text().unwrap_or_default();
                match (keyword.as_str(), tail) {
                    ("elseif", [test, body, tail @ ..]) => {
                        state.branches.push((Test::new(test), body_program(body)?));
                        rest = tail;
                    }
                    ("else", [body]) => {
                        state.otherwise = Some(body_program(body)?);
                        return Ok(());
                    }
                    ("elseif", _) | ("else", _) => return Err(wrong_args(IF_USAGE)),
                    (other, _) => {
                        return Err(Outcome::error(format!("invalid keyword \"{}\"", other)))
                    }
                }
            }
        }
    }
}

fn next_branch(mut state: Pooled<IfState>) -> Outcome {
    let scope = state.scope();
    while state.index < state.branches.len() {
        match &state.branches[state.index].0 {
            Test::Script(program) => {
                let program = program.clone();
                return yield_continuation_with_data(&scope, program, state, if_tested);
            }
            Test::Literal(value) => match value.as_bool() {
                Ok(true) => return run_branch(&state, &scope),
                Ok(false) => state.index += 1,
                Err(error) => return error,
            },
        }
    }
    match state.otherwise.clone() {
        Some(program) => yield_continuation(&scope, program),
        None => Outcome::ok(Value::Nil),
    }
}

fn if_tested(result: Outcome, mut state: Pooled<IfState>) -> Outcome {
    if !result.is_ok() {
        return result;
    }
    match result.value.as_bool() {
        Ok(true) => run_branch(&state, &state.scope()),
        Ok(false) => {
            state.index += 1;
            next_branch(state)
        }
        Err(error) => error,
    }
}

/// The body's result is the command's result; the state is released here
fn run_branch(state: &IfState, scope: &ScopeRef) -> Outcome {
    let program = state.branches[state.index].1.clone();
    yield_continuation(scope, program)
}

/* ===================== when ===================== */

const WHEN_USAGE: &str = "when ?command? ((test body) ...)";

enum Selector {
    None,
    Prefix(Vec<Value>),
    Script(Rc<Program>),
}

#[derive(Default)]
struct WhenState {
    scope: Option<ScopeRef>,
    selector: Option<Selector>,
    cases: Vec<(Value, Rc<Program>)>,
    default: Option<Rc<Program>>,
    index: usize,
    phase: WhenPhase,
}

impl WhenState {
    fn scope(&self) -> ScopeRef {
        match &self.scope {
            Some(scope) => scope.clone(),
            None => unreachable!("when state without scope"),
        }
    }
}

impl Recycle for WhenState {
    fn recycle(&mut self) {
        self.scope = None;
        self.selector = None;
        self.cases.clear();
        self.default = None;
        self.index = 0;
        self.phase = WhenPhase::default();
    }
}

thread_local! {
    static WHEN_STATES: Pool<WhenState> = const { Pool::new() };
}

fn when(args: &[Value], scope: &ScopeRef) -> Outcome {
    let (selector, cases) = match args {
        [_, cases] => (Selector::None, cases),
        [_, Value::Script(script), cases] => (Selector::Script(script.program()), cases),
        [_, Value::Tuple(prefix), cases] => (Selector::Prefix(prefix.to_vec()), cases),
        [_, command, cases] => (Selector::Prefix(vec![command.clone()]), cases),
        _ => return wrong_args(WHEN_USAGE),
    };
    let cases = match case_list(cases) {
        Ok(cases) => cases,
        Err(error) => return error,
    };

    let mut state = Pooled::acquire(&WHEN_STATES);
    let mut pairs = cases.chunks_exact(2);
    for pair in pairs.by_ref() {
        match body_program(&pair[1]) {
            Ok(program) => state.cases.push((pair[0].clone(), program)),
            Err(error) => return error,
        }
    }
    if let [body] = pairs.remainder() {
        match body_program(body) {
            Ok(program) => state.default = Some(program),
            Err(error) => return error,
        }
    }
    state.selector = Some(selector);
    state.scope = Some(scope.clone());
    next_case(state)
}

/// Case words from a tuple or a block of static words
fn case_list(cases: &Value) -> OutcomeResult<Vec<Value>> {
    match cases {
        Value::Tuple(items) => Ok(items.to_vec()),
        Value::Script(script) => script
            .script()
            .sentences
            .iter()
            .flat_map(|sentence| sentence.words.iter())
            .map(static_word)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Outcome::error("invalid case list")),
        _ => Err(Outcome::error("invalid case list")),
    }
}

fn static_word(word: &Word) -> Option<Value> {
    match word.morphemes.as_slice() {
        [Morpheme::Literal { value }] => Some(Value::from(value.as_str())),
        [Morpheme::Block { source, script }] => {
            Some(Value::from(ScriptValue::new(source.as_str(), script.clone())))
        }
        [Morpheme::String { parts }] => match parts.as_slice() {
            [] => Some(Value::from("")),
            [Morpheme::Literal { value }] => Some(Value::from(value.as_str())),
            _ => None,
        },
        [Morpheme::Tuple { words }] => words
            .iter()
            .map(static_word)
            .collect::<Option<Vec<_>>>()
            .map(Value::tuple),
        _ => None,
    }
}

fn next_case(mut state: Pooled<WhenState>) -> Outcome {
    let scope = state.scope();
    if state.index >= state.cases.len() {
        return match state.default.clone() {
            Some(program) => yield_continuation(&scope, program),
            None => Outcome::ok(Value::Nil),
        };
    }
    let test = state.cases[state.index].0.clone();
    match &state.selector {
        Some(Selector::Script(program)) => {
            let program = program.clone();
            state.phase = WhenPhase::InSelector;
            yield_continuation_with_data(&scope, program, state, when_step)
        }
        Some(Selector::Prefix(prefix)) => {
            let program = selected_test(prefix, &test);
            state.phase = WhenPhase::InTest;
            yield_continuation_with_data(&scope, program, state, when_step)
        }
        Some(Selector::None) | None => match test {
            Value::Script(script) => {
                state.phase = WhenPhase::InTest;
                yield_continuation_with_data(&scope, script.program(), state, when_step)
            }
            Value::Tuple(words) => {
                state.phase = WhenPhase::InTest;
                let program = Rc::new(Compiler::compile_sentence(&words));
                yield_continuation_with_data(&scope, program, state, when_step)
            }
            other => match other.as_bool() {
                Ok(true) => run_case(&state, &scope),
                Ok(false) => {
                    state.index += 1;
                    next_case(state)
                }
                Err(error) => error,
            },
        },
    }
}

fn when_step(result: Outcome, mut state: Pooled<WhenState>) -> Outcome {
    if !result.is_ok() {
        return result;
    }
    let scope = state.scope();
    let phase = state.phase;
    match phase {
        WhenPhase::InSelector => {
            let prefix = match result.value {
                Value::Tuple(words) => words.to_vec(),
                other => vec![other],
            };
            let test = state.cases[state.index].0.clone();
            let program = selected_test(&prefix, &test);
            state.phase = WhenPhase::InTest;
            yield_continuation_with_data(&scope, program, state, when_step)
        }
        WhenPhase::InTest => match result.value.as_bool() {
            Ok(true) => run_case(&state, &scope),
            Ok(false) => {
                state.index += 1;
                next_case(state)
            }
            Err(error) => error,
        },
    }
}

/// Selector words followed by the test: tuples are spliced, other values appended
fn selected_test(prefix: &[Value], test: &Value) -> Rc<Program> {
    let mut words = prefix.to_vec();
    match test {
        Value::Tuple(items) => words.extend(items.iter().cloned()),
        other => words.push(other.clone()),
    }
    Rc::new(Compiler::compile_sentence(&words))
}

fn run_case(state: &WhenState, scope: &ScopeRef) -> Outcome {
    let program = state.cases[state.index].1.clone();
    yield_continuation(scope, program)
}
