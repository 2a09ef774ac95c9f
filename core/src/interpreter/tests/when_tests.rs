//! Tests for When statements

use super::helpers::{ok, prepare, run};
use crate::interpreter::*;

#[test]
fn test_when_without_selector() {
    assert_eq!(
        run("when ({idem false} {idem a} {idem true} {idem b})"),
        ok("b")
    );
    assert_eq!(run("when (false {idem a} true {idem b})"), ok("b"));
}

#[test]
fn test_when_default_and_no_match() {
    assert_eq!(run("when (false {idem a} {idem c})"), ok("c"));
    assert_eq!(run("when (false {idem a})"), ok(Value::Nil));
    assert_eq!(run("when ()"), ok(Value::Nil));
    assert_eq!(run("when ({idem d})"), ok("d"));
}

#[test]
fn test_when_tuple_test_is_invoked() {
    assert_eq!(run("when ((1 == 2) {idem a} (2 == 2) {idem b})"), ok("b"));
}

#[test]
fn test_when_literal_selector() {
    // Tests are appended to the selector: idem false, idem true
    assert_eq!(run("when idem (false {idem a} true {idem b})"), ok("b"));
}

#[test]
fn test_when_tuple_selector() {
    assert_eq!(run("when (1 ==) (2 {idem a} 1 {idem b})"), ok("b"));
    // Tuple tests are spliced after the selector words
    assert_eq!(run("when (1) ((== 2) {idem a} (== 1) {idem b})"), ok("b"));
}

#[test]
fn test_when_script_selector() {
    assert_eq!(
        run("set x 1; when {idem ($x ==)} (2 {idem a} 1 {idem b})"),
        ok("b")
    );
}

#[test]
fn test_when_block_of_cases() {
    assert_eq!(
        run("when {\n  false {idem a}\n  true {idem b}\n}"),
        ok("b")
    );
    assert_eq!(
        run("when {false {idem a} $x}"),
        Outcome::error("invalid case list")
    );
}

#[test]
fn test_when_codes_propagate() {
    assert_eq!(run("when {break} (1 {idem a})"), Outcome::break_());
    assert_eq!(run("when ({error oops} {idem a})"), Outcome::error("oops"));
    assert_eq!(run("when (true {continue})"), Outcome::continue_());
    assert_eq!(
        run("when (maybe {idem a})"),
        Outcome::error("invalid boolean \"maybe\"")
    );
}

#[test]
fn test_when_arguments() {
    let usage = "wrong # args: should be \"when ?command? ((test body) ...)\"";
    assert_eq!(run("when"), Outcome::error(usage));
    assert_eq!(run("when a b c"), Outcome::error(usage));
    assert_eq!(run("when (true b)"), Outcome::error("body must be a script"));
}

#[test]
fn test_when_yield_in_test_and_body() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "when ({yield t} {idem _[yield b]_})");

    assert_eq!(process.run(), Outcome::yield_(Value::from("t")));
    process.yield_back(Value::Bool(true));
    assert_eq!(process.run(), Outcome::yield_(Value::from("b")));
    process.yield_back(Value::from("x"));
    assert_eq!(process.run(), ok("_x_"));
}

#[test]
fn test_when_selector_evaluated_per_case() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "when {yield sel} (2 {idem a} 1 {idem b})");
    let selector = Value::tuple(vec![Value::from("1"), Value::from("==")]);

    assert_eq!(process.run(), Outcome::yield_(Value::from("sel")));
    process.yield_back(selector.clone());
    assert_eq!(process.run(), Outcome::yield_(Value::from("sel")));
    process.yield_back(selector);
    assert_eq!(process.run(), ok("b"));
}
