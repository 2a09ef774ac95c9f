//! Test helpers for interpreter tests
//!
//! Common utilities for compiling scripts and driving processes

use std::rc::Rc;

use crate::interpreter::compiler::{Compiler, Program};
use crate::interpreter::parser;
use crate::interpreter::process::{Process, ProcessOptions};
use crate::interpreter::scope::{Scope, ScopeRef};
use crate::interpreter::types::control::Outcome;
use crate::interpreter::types::values::Value;

/// Parse and compile a script, panicking on syntax errors
pub fn parse_and_compile(source: &str) -> Rc<Program> {
    let script = parser::parse(source).expect("Parse script failed");
    Rc::new(Compiler::new(None).compile(&script))
}

/// Process for `source` in `scope`
pub fn prepare(scope: &ScopeRef, source: &str) -> Process {
    scope.prepare_process(parse_and_compile(source))
}

/// Process for `source` in `scope`, capturing error stacks
pub fn prepare_capturing(scope: &ScopeRef, source: &str) -> Process {
    scope.prepare_process_with(
        parse_and_compile(source),
        ProcessOptions {
            capture_error_stack: true,
        },
    )
}

/// Run `source` in a fresh root scope
pub fn run(source: &str) -> Outcome {
    run_in(&Scope::new_root(), source)
}

/// Run `source` in `scope` up to its first YIELD or its end
pub fn run_in(scope: &ScopeRef, source: &str) -> Outcome {
    prepare(scope, source).run()
}

pub fn ok(value: impl Into<Value>) -> Outcome {
    Outcome::ok(value.into())
}

pub fn str_tuple(items: &[&str]) -> Value {
    Value::tuple(items.iter().map(|item| Value::from(*item)).collect())
}
