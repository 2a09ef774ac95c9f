//! Tests for Catch statements and pass

use super::helpers::{ok, prepare, run, run_in, str_tuple};
use crate::interpreter::*;

#[test]
fn test_catch_bare_describes_result() {
    assert_eq!(run("catch {return val}"), ok(str_tuple(&["return", "val"])));
    assert_eq!(run("catch {error msg}"), ok(str_tuple(&["error", "msg"])));
    assert_eq!(run("catch {idem a}"), ok(str_tuple(&["ok", "a"])));
    assert_eq!(run("catch {break}"), ok(str_tuple(&["break"])));
    assert_eq!(run("catch {continue}"), ok(str_tuple(&["continue"])));
    assert_eq!(
        run("catch {}"),
        ok(Value::tuple(vec![Value::from("ok"), Value::Nil]))
    );
}

#[test]
fn test_catch_handlers() {
    assert_eq!(run("catch {return val} return v {idem $v}"), ok("val"));
    assert_eq!(
        run("catch {error oops} error m {idem \"caught $m\"}"),
        ok("caught oops")
    );
    assert_eq!(run("catch {break} break {idem b}"), ok("b"));
    assert_eq!(run("catch {continue} continue {idem c}"), ok("c"));
}

#[test]
fn test_catch_handler_binding_is_scoped() {
    let scope = Scope::new_root();
    assert_eq!(run_in(&scope, "catch {return val} return v {idem $v}"), ok("val"));
    assert_eq!(run_in(&scope, "exists v"), ok(false));
}

#[test]
fn test_catch_handler_destructures_value() {
    assert_eq!(
        run("catch {return (a b)} return (x y) {idem $y$x}"),
        ok("ba")
    );
}

#[test]
fn test_catch_unmatched_passes_through() {
    assert_eq!(
        run("catch {error oops} return v {idem x}"),
        Outcome::error("oops")
    );
    assert_eq!(run("catch {idem a} error m {idem x}"), ok("a"));
    assert_eq!(
        run("catch {return r} error m {idem x}"),
        Outcome::return_(Value::from("r"))
    );
}

#[test]
fn test_catch_handler_result_replaces_outcome() {
    assert_eq!(
        run("catch {error oops} error m {error \"again $m\"}"),
        Outcome::error("again oops")
    );
    assert_eq!(run("catch {break} break {continue}"), Outcome::continue_());
}

#[test]
fn test_catch_finally_runs_once() {
    let scope = Scope::new_root();
    run_in(&scope, "set n 0");

    assert_eq!(
        run_in(&scope, "catch {error oops} error m {idem h} finally {set n [$n + 1]}"),
        ok("h")
    );
    assert_eq!(scope.resolve_variable("n"), Some(Value::Integer(1)));

    assert_eq!(
        run_in(&scope, "catch {idem a} error m {idem h} finally {set n [$n + 1]}"),
        ok("a")
    );
    assert_eq!(scope.resolve_variable("n"), Some(Value::Integer(2)));

    assert_eq!(
        run_in(&scope, "catch {error oops} finally {set n [$n + 1]}"),
        Outcome::error("oops")
    );
    assert_eq!(scope.resolve_variable("n"), Some(Value::Integer(3)));
}

#[test]
fn test_catch_finally_override() {
    assert_eq!(run("catch {idem a} finally {error f}"), Outcome::error("f"));
    assert_eq!(run("catch {error e} finally {idem f}"), Outcome::error("e"));
    assert_eq!(
        run("catch {idem a} finally {return r}"),
        Outcome::return_(Value::from("r"))
    );
}

#[test]
fn test_catch_pass() {
    assert_eq!(
        run("catch {error oops} error m {pass}"),
        Outcome::error("oops")
    );
    assert_eq!(
        run("catch {return r} return v {pass}"),
        Outcome::return_(Value::from("r"))
    );

    let scope = Scope::new_root();
    assert_eq!(
        run_in(&scope, "catch {error oops} error m {pass} finally {set n 1}"),
        Outcome::error("oops")
    );
    assert_eq!(scope.resolve_variable("n"), Some(Value::from("1")));
}

#[test]
fn test_pass_outside_catch() {
    assert_eq!(run("pass"), Outcome::custom(&PASS, Value::Nil));
    assert_eq!(
        run("catch {pass}"),
        ok(Value::tuple(vec![Value::from("pass"), Value::Nil]))
    );
}

#[test]
fn test_catch_yield_without_handler() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "catch {idem _[yield val1]_} error m {idem x}");

    assert_eq!(process.run(), Outcome::yield_(Value::from("val1")));
    process.yield_back(Value::from("val2"));
    assert_eq!(process.run(), ok("_val2_"));
}

#[test]
fn test_catch_yield_handler_feeds_body() {
    assert_eq!(
        run("catch {idem _[yield a]_} yield v {idem b$v}"),
        ok("_ba_")
    );
}

#[test]
fn test_catch_yield_handler_pass() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "catch {idem _[yield a]_} yield v {pass}");

    assert_eq!(process.run(), Outcome::yield_(Value::from("a")));
    process.yield_back(Value::from("z"));
    assert_eq!(process.run(), ok("_z_"));
}

#[test]
fn test_catch_yield_in_handler() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "catch {error oops} error m {idem _[yield $m]_}");

    assert_eq!(process.run(), Outcome::yield_(Value::from("oops")));
    process.yield_back(Value::from("x"));
    assert_eq!(process.run(), ok("_x_"));
}

#[test]
fn test_catch_yield_in_finally() {
    let scope = Scope::new_root();
    let mut process = prepare(&scope, "catch {idem a} finally {yield f}");

    assert_eq!(process.run(), Outcome::yield_(Value::from("f")));
    process.yield_back(Value::from("g"));
    assert_eq!(process.run(), ok("a"));
}

#[test]
fn test_catch_inside_loop() {
    let source = r#"
        set r ""
        loop i v [list (a b c)] {
            set r $r[catch {if {$i == 1} {error skip}; idem $v} error m {idem -}]
        }
        get r
    "#;
    assert_eq!(run(source), ok("a-c"));
}

#[test]
fn test_catch_arguments() {
    assert_eq!(run("catch {} foo {}"), Outcome::error("invalid keyword \"foo\""));
    assert!(run("catch").code == ResultCode::Error);
    assert!(run("catch {} error m").code == ResultCode::Error);
    assert_eq!(run("catch body"), Outcome::error("body must be a script"));
}
