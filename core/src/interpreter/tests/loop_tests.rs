//! Tests for Loop statements

use super::helpers::{ok, prepare, run};
use crate::interpreter::*;

#[test]
fn test_loop_over_list() {
    assert_eq!(
        run("set r \"\"; loop v [list (a b c)] {set r $r$v}; get r"),
        ok("abc")
    );
}

#[test]
fn test_loop_with_index() {
    assert_eq!(
        run("set r \"\"; loop i v [list (a b)] {set r $r$i$v}; get r"),
        ok("0a1b")
    );
}

#[test]
fn test_loop_over_dict() {
    assert_eq!(
        run("set r \"\"; loop (k v) [dict (x 1 y 2)] {set r $r$k=$v}; get r"),
        ok("x=1y=2")
    );
}

#[test]
fn test_loop_parallel_sources() {
    // Exhausted sources leave their names unbound
    let source = r#"
        set r ""
        loop a [list (1 2 3)] b [list (x)] {
            if {exists b} {set r $r$a$b} else {set r $r$a}
        }
        get r
    "#;
    assert_eq!(run(source), ok("1x23"));
}

#[test]
fn test_loop_result() {
    assert_eq!(run("loop v [list (a b)] {idem $v}"), ok("b"));
    assert_eq!(run("loop v [list ()] {idem x}"), ok(Value::Nil));
    assert_eq!(
        run("loop i v [list (a b c)] {if {$i == 1} {break}; idem $v}"),
        ok("a")
    );
}

#[test]
fn test_loop_without_sources_runs_until_break() {
    assert_eq!(
        run("set n 0; loop i {if {$i == 5} {break}; set n $i}; get n"),
        ok(Value::Integer(4))
    );
    assert_eq!(run("loop {break}"), ok(Value::Nil));
}

#[test]
fn test_loop_body_continue() {
    assert_eq!(
        run("set r \"\"; loop i v [list (a b c)] {if {$i == 1} {continue}; set r $r$v}; get r"),
        ok("ac")
    );
}

#[test]
fn test_loop_command_source() {
    // A source command that breaks retires itself; one that does not binds its result
    let source = r#"
        macro cmd (i) {
            if {$i == 1} {break}
            idem "\[$i\]"
        }
        set r ""
        loop index v [list (a b c)] e cmd {
            if {exists e} {set r "$r $v $e"} else {set r "$r $v skipped"}
        }
        get r
    "#;
    assert_eq!(run(source), ok(" a [0] b skipped c skipped"));
}

#[test]
fn test_loop_command_source_continue() {
    // A source that continues leaves its name unbound for that round
    let source = r#"
        macro skip2 (i) {
            if {$i == 4} {break}
            if {$i == 2} {continue}
            idem $i
        }
        set r ""
        loop n skip2 {if {exists n} {set r $r$n}}
        get r
    "#;
    assert_eq!(run(source), ok("013"));
}

#[test]
fn test_loop_script_source() {
    let source = r#"
        set n 0
        loop v {set n [$n + 1]; if {$n > 3} {break}; idem $n} {set r $v}
        get r
    "#;
    assert_eq!(run(source), ok(Value::Integer(3)));
}

#[test]
fn test_loop_source_errors() {
    assert_eq!(run("loop v {error oops} {idem x}"), Outcome::error("oops"));
    assert_eq!(
        run("loop v [list (a)] v [list (b)] {idem x}"),
        Outcome::error("cannot redefine local \"v\"")
    );
    assert_eq!(
        run("loop (a b) [list (x)] {idem x}"),
        Outcome::error("bad value shape")
    );
    assert_eq!(run("loop v [] {idem x}"), Outcome::error("invalid source"));
}

#[test]
fn test_loop_arguments() {
    assert_eq!(
        run("loop"),
        Outcome::error("wrong # args: should be \"loop ?index? ?value source ...? body\"")
    );
    assert_eq!(run("loop v [list (a)] body"), Outcome::error("body must be a script"));
}

#[test]
fn test_loop_locals_do_not_escape() {
    assert_eq!(
        run("loop i v [list (a)] {idem $v}; list ([exists i] [exists v])"),
        ok(Value::list(vec![Value::Bool(false), Value::Bool(false)]))
    );
}

#[test]
fn test_loop_yield_in_body() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "loop i v [list (x)] {idem _[yield $v]_}");

    assert_eq!(process.run(), Outcome::yield_(Value::from("x")));
    process.yield_back(Value::from("y"));
    assert_eq!(process.run(), ok("_y_"));
}

#[test]
fn test_loop_yield_in_source() {
    let scope = Scope::new_root();
    let mut process = prepare(
        &scope,
        "set r \"\"; loop v {if {[yield src] == 0} {break} else {idem a}} {set r $r$v}; get r",
    );

    assert_eq!(process.run(), Outcome::yield_(Value::from("src")));
    process.yield_back(Value::Integer(1));
    assert_eq!(process.run(), Outcome::yield_(Value::from("src")));
    process.yield_back(Value::Integer(1));
    assert_eq!(process.run(), Outcome::yield_(Value::from("src")));
    process.yield_back(Value::Integer(0));
    assert_eq!(process.run(), ok("aa"));
}
