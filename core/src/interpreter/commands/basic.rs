//! Result-code commands: idem, return, yield, error, break, continue, pass,
//! tailcall, eval

use std::rc::Rc;

use super::{body_program, wrong_args, Command, NativeCommand};
use crate::interpreter::process::{yield_continuation, ContinuationValue};
use crate::interpreter::scope::ScopeRef;
use crate::interpreter::types::control::{Outcome, ResultCode, PASS};
use crate::interpreter::types::values::Value;

pub fn register(scope: &ScopeRef) {
    scope.register_named_command("idem", Rc::new(NativeCommand(idem)));
    scope.register_named_command("return", Rc::new(NativeCommand(return_)));
    scope.register_named_command("yield", Rc::new(YieldCommand));
    scope.register_named_command("error", Rc::new(NativeCommand(error)));
    scope.register_named_command("break", Rc::new(NativeCommand(break_)));
    scope.register_named_command("continue", Rc::new(NativeCommand(continue_)));
    scope.register_named_command("pass", Rc::new(NativeCommand(pass)));
    scope.register_named_command("tailcall", Rc::new(NativeCommand(tailcall)));
    scope.register_named_command("eval", Rc::new(NativeCommand(eval)));
}

fn idem(args: &[Value], _scope: &ScopeRef) -> Outcome {
    match args {
        [_, value] => Outcome::ok(value.clone()),
        _ => wrong_args("idem value"),
    }
}

fn return_(args: &[Value], _scope: &ScopeRef) -> Outcome {
    match args {
        [_] => Outcome::return_(Value::Nil),
        [_, value] => Outcome::return_(value.clone()),
        _ => wrong_args("return ?result?"),
    }
}

/// Suspends the process; resumes with the value supplied by `yield_back`
struct YieldCommand;

impl Command for YieldCommand {
    fn execute(&self, args: &[Value], _scope: &ScopeRef) -> Outcome {
        match args {
            [_] => Outcome::yield_(Value::Nil),
            [_, value] => Outcome::yield_(value.clone()),
            _ => wrong_args("yield ?value?"),
        }
    }
}

fn error(args: &[Value], _scope: &ScopeRef) -> Outcome {
    match args {
        [_, message] => match message.as_text() {
            Ok(_) => Outcome::new(ResultCode::Error, message.clone()),
            Err(_) => Outcome::error("invalid message"),
        },
        _ => wrong_args("error message"),
    }
}

fn break_(args: &[Value], _scope: &ScopeRef) -> Outcome {
    match args {
        [_] => Outcome::break_(),
        _ => wrong_args("break"),
    }
}

fn continue_(args: &[Value], _scope: &ScopeRef) -> Outcome {
    match args {
        [_] => Outcome::continue_(),
        _ => wrong_args("continue"),
    }
}

fn pass(args: &[Value], _scope: &ScopeRef) -> Outcome {
    match args {
        [_] => Outcome::custom(&PASS, Value::Nil),
        _ => wrong_args("pass"),
    }
}

/// Replaces the current program with `body`
fn tailcall(args: &[Value], scope: &ScopeRef) -> Outcome {
    let [_, body] = args else {
        return wrong_args("tailcall body");
    };
    match body_program(body) {
        Ok(program) => Outcome::return_(Value::Continuation(Rc::new(ContinuationValue::new(
            scope.clone(),
            program,
        )))),
        Err(error) => error,
    }
}

fn eval(args: &[Value], scope: &ScopeRef) -> Outcome {
    let [_, body] = args else {
        return wrong_args("eval body");
    };
    match body_program(body) {
        Ok(program) => yield_continuation(scope, program),
        Err(error) => error,
    }
}
