//! Numeric literal commands
//!
//! A command name that reads as a number evaluates to that number, or applies
//! a binary operator: `1 + 2`, `$i == 1`.

use super::{wrong_args, Command};
use crate::interpreter::scope::ScopeRef;
use crate::interpreter::types::control::{Outcome, OutcomeResult};
use crate::interpreter::types::values::{Number, Value};

pub struct NumberCommand;

impl Command for NumberCommand {
    fn execute(&self, args: &[Value], _scope: &ScopeRef) -> Outcome {
        evaluate(args).unwrap_or_else(|e| e)
    }
}

fn evaluate(args: &[Value]) -> OutcomeResult<Outcome> {
    let [head, rest @ ..] = args else {
        return Err(wrong_args("number ?operator operand?"));
    };
    let left = head.as_number()?;
    match rest {
        [] => Ok(Outcome::ok(Value::from(left))),
        [op, right] => {
            let op = op.as_text()?;
            let right = right.as_number()?;
            apply(&op, left, right).map(Outcome::ok)
        }
        _ => Err(wrong_args("number ?operator operand?")),
    }
}

fn apply(op: &str, left: Number, right: Number) -> OutcomeResult<Value> {
    let (a, b) = (left.as_f64(), right.as_f64());
    let value = match op {
        "+" => arithmetic(left, right, i64::checked_add, a + b),
        "-" => arithmetic(left, right, i64::checked_sub, a - b),
        "*" => arithmetic(left, right, i64::checked_mul, a * b),
        "/" => {
            if b == 0.0 {
                return Err(Outcome::error("division by zero"));
            }
            match (left, right) {
                (Number::Integer(x), Number::Integer(y)) if x % y == 0 => Value::Integer(x / y),
                _ => Value::Real(a / b),
            }
        }
        "==" => Value::Bool(a == b),
        "!=" => Value::Bool(a != b),
        "<" => Value::Bool(a < b),
        "<=" => Value::Bool(a <= b),
        ">" => Value::Bool(a > b),
        ">=" => Value::Bool(a >= b),
        other => return Err(Outcome::error(format!("invalid operator \"{}\"", other))),
    };
    Ok(value)
}

/// Integer arithmetic when both sides are integers and the result fits
fn arithmetic(left: Number, right: Number, op: fn(i64, i64) -> Option<i64>, real: f64) -> Value {
    match (left, right) {
        (Number::Integer(x), Number::Integer(y)) => match op(x, y) {
            Some(i) => Value::Integer(i),
            None => Value::Real(real),
        },
        _ => Value::Real(real),
    }
}
