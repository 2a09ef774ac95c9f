//! Variable commands: let, set, get, exists

use std::rc::Rc;

use super::{wrong_args, NativeCommand};
use crate::interpreter::scope::ScopeRef;
use crate::interpreter::types::control::{Outcome, OutcomeResult};
use crate::interpreter::types::values::Value;

pub fn register(scope: &ScopeRef) {
    scope.register_named_command("let", Rc::new(NativeCommand(let_)));
    scope.register_named_command("set", Rc::new(NativeCommand(set)));
    scope.register_named_command("get", Rc::new(NativeCommand(get)));
    scope.register_named_command("exists", Rc::new(NativeCommand(exists)));
}

fn let_(args: &[Value], scope: &ScopeRef) -> Outcome {
    match args {
        [_, shape, value] => scope.destructure_constant(shape, value),
        _ => wrong_args("let constname value"),
    }
}

fn set(args: &[Value], scope: &ScopeRef) -> Outcome {
    match args {
        [_, shape, value] => scope.destructure_variable(shape, value),
        _ => wrong_args("set varname value"),
    }
}

fn get(args: &[Value], scope: &ScopeRef) -> Outcome {
    match args {
        [_, name] => get_value(scope, name).map(Outcome::ok).unwrap_or_else(|e| e),
        _ => wrong_args("get varname"),
    }
}

/// Tuples of names read as tuples of values
fn get_value(scope: &ScopeRef, name: &Value) -> OutcomeResult<Value> {
    match name {
        Value::Tuple(names) => names
            .iter()
            .map(|name| get_value(scope, name))
            .collect::<OutcomeResult<Vec<_>>>()
            .map(Value::tuple),
        other => {
            let name = other
                .as_text()
                .map_err(|_| Outcome::error("invalid variable name"))?;
            scope.get_variable(&name)
        }
    }
}

fn exists(args: &[Value], scope: &ScopeRef) -> Outcome {
    let [_, name] = args else {
        return wrong_args("exists varname");
    };
    match name.as_text() {
        Ok(name) => Outcome::ok(Value::Bool(scope.resolve_variable(&name).is_some())),
        Err(_) => Outcome::error("invalid variable name"),
    }
}
