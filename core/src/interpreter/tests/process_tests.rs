//! Tests for the process trampoline: suspension, resumption, tail calls and
//! error stacks

use super::helpers::{ok, parse_and_compile, prepare, prepare_capturing, run};
use crate::interpreter::*;

#[test]
fn test_empty_script() {
    assert_eq!(run(""), ok(Value::Nil));
}

#[test]
fn test_yield_then_yield_back() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "idem _[yield val1]_");

    assert_eq!(process.run(), Outcome::yield_(Value::from("val1")));
    process.yield_back(Value::from("val2"));
    assert_eq!(process.run(), ok("_val2_"));
}

#[test]
fn test_yield_without_yield_back_resumes_with_yielded_value() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "idem [yield a]");

    assert_eq!(process.run(), Outcome::yield_(Value::from("a")));
    assert_eq!(process.run(), ok("a"));
}

#[test]
fn test_successive_yields() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "set a [yield 1]; set b [yield 2]; idem $a$b");

    assert_eq!(process.run(), Outcome::yield_(Value::from("1")));
    process.yield_back(Value::from("x"));
    assert_eq!(process.run(), Outcome::yield_(Value::from("2")));
    process.yield_back(Value::from("y"));
    assert_eq!(process.run(), ok("xy"));
}

#[test]
fn test_same_program_fresh_processes() {
    let program = parse_and_compile("if true {1}");

    for _ in 0..3 {
        let scope = Scope::new_root();
        let mut process = scope.prepare_process(program.clone());
        assert_eq!(process.run(), ok(Value::Integer(1)));
    }
}

#[test]
fn test_eval_runs_in_current_scope() {
    assert_eq!(run("set x a; eval {idem $x}"), ok("a"));
}

#[test]
fn test_top_level_tailcall() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "tailcall {idem a}; idem b");

    assert_eq!(process.run(), ok("a"));
    assert_eq!(process.depth(), 1);
}

#[test]
fn test_tailcall_matches_last_statement() {
    let direct = run("proc p () {idem a}; p");
    let tail = run("proc p () {tailcall {idem a}; idem b}; p");
    assert_eq!(tail, direct);
    assert_eq!(tail, ok("a"));
}

#[test]
fn test_tailcall_with_yield() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "proc p () {tailcall {idem _[yield x]_}}; p");

    assert_eq!(process.run(), Outcome::yield_(Value::from("x")));
    process.yield_back(Value::from("y"));
    assert_eq!(process.run(), ok("_y_"));
}

#[test]
fn test_tailcall_recursion() {
    let source = r#"
        proc count (n) {
            if {$n == 0} {idem done} else {tailcall {count [$n - 1]}}
        }
        count 200
    "#;
    assert_eq!(run(source), ok("done"));
}

#[test]
fn test_unresolved_names() {
    assert_eq!(run("idem $nope"), Outcome::error("cannot resolve variable \"nope\""));
    assert_eq!(run("nocmd a"), Outcome::error("cannot resolve command \"nocmd\""));
}

#[test]
fn test_error_stack_innermost_first() {
    let scope = Scope::new_root();
    let mut process = prepare_capturing(&scope, "proc fail () {error oops}\nfail");

    let result = process.run();
    assert_eq!(result, Outcome::error("oops"));
    let Some(stack) = result.error_stack() else {
        unreachable!("Expected error stack")
    };
    assert_eq!(stack.depth(), 2);
    assert_eq!(
        stack.frames()[0].frame,
        vec![Value::from("error"), Value::from("oops")]
    );
    assert_eq!(stack.frames()[1].frame, vec![Value::from("fail")]);
    let Some(position) = stack.frames()[1].position else {
        unreachable!("Expected source position")
    };
    assert_eq!((position.line, position.column), (2, 1));
}

#[test]
fn test_error_stack_stripped_when_disabled() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "proc fail () {error oops}; fail");

    let result = process.run();
    assert_eq!(result, Outcome::error("oops"));
    assert!(result.data.is_none());
}

#[test]
fn test_nested_process_error_stack_not_forwarded() {
    // catch runs its body in a nested process without error-stack capture
    let scope = Scope::new_root();
    let mut process = prepare_capturing(&scope, "catch {error inner} finally {}");

    let result = process.run();
    assert_eq!(result, Outcome::error("inner"));
    let Some(stack) = result.error_stack() else {
        unreachable!("Expected error stack")
    };
    assert_eq!(stack.depth(), 1);
    assert_eq!(stack.frames()[0].frame[0], Value::from("catch"));
}

/// Words of each error-stack frame, innermost first
fn frame_words(result: &Outcome) -> Vec<String> {
    let Some(stack) = result.error_stack() else {
        unreachable!("Expected error stack, got {:?}", result)
    };
    stack
        .frames()
        .iter()
        .map(|frame| {
            frame
                .frame
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[test]
fn test_tailcall_error_stack() {
    let scope = Scope::new_root();

    // Top-level tailcall replaces the context, leaving no frame of its own
    let result = prepare_capturing(&scope, "tailcall {error x}").run();
    assert_eq!(result, Outcome::error("x"));
    assert_eq!(frame_words(&result), vec!["error x"]);

    // Inside a proc the body context is delegated and keeps its frame
    let result = prepare_capturing(&scope, "proc p () {tailcall {error x}}; p").run();
    assert_eq!(result, Outcome::error("x"));
    assert_eq!(
        frame_words(&result),
        vec!["error x", "tailcall {error x}", "p"]
    );

    let result = prepare_capturing(&scope, "proc q () {error x}; q").run();
    assert_eq!(frame_words(&result), vec!["error x", "q"]);
}
