//! Collection constructors: list, dict

use std::rc::Rc;

use super::{wrong_args, NativeCommand};
use crate::interpreter::scope::ScopeRef;
use crate::interpreter::types::control::Outcome;
use crate::interpreter::types::values::Value;

pub fn register(scope: &ScopeRef) {
    scope.register_named_command("list", Rc::new(NativeCommand(list)));
    scope.register_named_command("dict", Rc::new(NativeCommand(dict)));
}

fn list(args: &[Value], _scope: &ScopeRef) -> Outcome {
    match args {
        [_] => Outcome::ok(Value::list(Vec::new())),
        [_, items] => match items.as_list() {
            Ok(items) => Outcome::ok(Value::list(items.to_vec())),
            Err(error) => error,
        },
        _ => wrong_args("list ?items?"),
    }
}

fn dict(args: &[Value], _scope: &ScopeRef) -> Outcome {
    let items = match args {
        [_] => return Outcome::ok(Value::dict(Vec::new())),
        [_, Value::Dict(entries)] => return Outcome::ok(Value::Dict(entries.clone())),
        [_, items] => match items.as_list() {
            Ok(items) => items,
            Err(error) => return error,
        },
        _ => return wrong_args("dict ?entries?"),
    };
    if items.len() % 2 != 0 {
        return Outcome::error("invalid key-value list");
    }
    let mut entries: Vec<(String, Value)> = Vec::with_capacity(items.len() / 2);
    for pair in items.chunks(2) {
        let key = match pair[0].as_text() {
            Ok(key) => key,
            Err(_) => return Outcome::error("invalid key"),
        };
        let value = pair[1].clone();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }
    Outcome::ok(Value::dict(entries))
}
