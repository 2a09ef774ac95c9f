//! Tests for If statements

use super::helpers::{ok, prepare, run};
use crate::interpreter::*;

#[test]
fn test_if_literal_tests() {
    assert_eq!(run("if true {idem a} else {idem b}"), ok("a"));
    assert_eq!(run("if false {idem a} else {idem b}"), ok("b"));
    assert_eq!(run("if false {idem a}"), ok(Value::Nil));
}

#[test]
fn test_if_script_tests() {
    assert_eq!(run("if {1 == 2} {idem a}"), ok(Value::Nil));
    assert_eq!(
        run("if {idem false} {idem a} elseif {idem true} {idem b} else {idem c}"),
        ok("b")
    );
    assert_eq!(
        run("if {2 < 1} {idem a} elseif {3 < 1} {idem b} else {idem c}"),
        ok("c")
    );
}

#[test]
fn test_if_only_first_matching_body_runs() {
    // if true {set x a} elseif true {set x b}
    assert_eq!(
        run("set n 0; if true {set n [$n + 1]} elseif true {set n [$n + 10]}; get n"),
        ok(Value::Integer(1))
    );
}

#[test]
fn test_if_invalid_test_value() {
    assert_eq!(
        run("if maybe {idem a}"),
        Outcome::error("invalid boolean \"maybe\"")
    );
    assert_eq!(
        run("if {idem maybe} {idem a}"),
        Outcome::error("invalid boolean \"maybe\"")
    );
}

#[test]
fn test_if_test_codes_propagate() {
    assert_eq!(run("if {error oops} {idem a}"), Outcome::error("oops"));
    assert_eq!(run("if {return r} {idem a}"), Outcome::return_(Value::from("r")));
}

#[test]
fn test_if_body_codes_propagate() {
    assert_eq!(run("if true {break}"), Outcome::break_());
    assert_eq!(run("if true {continue}"), Outcome::continue_());
    assert_eq!(run("if true {return x; idem y}"), Outcome::return_(Value::from("x")));
}

#[test]
fn test_if_arguments() {
    let usage = "wrong # args: should be \"if test body ?elseif test body ...? ?else body?\"";
    assert_eq!(run("if true"), Outcome::error(usage));
    assert_eq!(run("if true {a} else"), Outcome::error(usage));
    assert_eq!(run("if true {a} elseif false"), Outcome::error(usage));
    assert_eq!(
        run("if true {a} otherwise {b}"),
        Outcome::error("invalid keyword \"otherwise\"")
    );
    assert_eq!(run("if true a"), Outcome::error("body must be a script"));
}

#[test]
fn test_if_yield_in_test_and_body() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "if {yield t} {idem _[yield b]_}");

    assert_eq!(process.run(), Outcome::yield_(Value::from("t")));
    process.yield_back(Value::Bool(true));
    assert_eq!(process.run(), Outcome::yield_(Value::from("b")));
    process.yield_back(Value::from("x"));
    assert_eq!(process.run(), ok("_x_"));
}

#[test]
fn test_if_yield_in_else() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "if false {idem a} else {idem [yield e]}; idem after");

    assert_eq!(process.run(), Outcome::yield_(Value::from("e")));
    process.yield_back(Value::from("x"));
    assert_eq!(process.run(), ok("after"));
}

#[test]
fn test_if_nested_yield() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "if true {if {yield inner} {idem yes} else {idem no}}");

    assert_eq!(process.run(), Outcome::yield_(Value::from("inner")));
    process.yield_back(Value::from("false"));
    assert_eq!(process.run(), ok("no"));
}
