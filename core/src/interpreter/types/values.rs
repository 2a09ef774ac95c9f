//! Runtime value types

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::ast::Script;
use super::control::{Outcome, OutcomeResult};
use crate::interpreter::commands::Command;
use crate::interpreter::compiler::{Compiler, Program};
use crate::interpreter::process::ContinuationValue;

/* ===================== Value ===================== */

/// Runtime value type
///
/// Clones are cheap: every variant with heap data is reference-counted.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Str(Rc<str>),
    List(Rc<Vec<Value>>),
    /// Insertion-ordered entries
    Dict(Rc<Vec<(String, Value)>>),
    Tuple(Rc<Vec<Value>>),
    Script(Rc<ScriptValue>),
    Command(Rc<dyn Command>),
    Continuation(Rc<ContinuationValue>),
}

/// Numeric view of a value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Real(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Real(r) => r,
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Integer(i) => Value::Integer(i),
            Number::Real(r) => Value::Real(r),
        }
    }
}

/// Parse text that looks like a number
///
/// Only text starting with a digit, a sign or a dot qualifies, so names like
/// `inf` or `nan` never read as numbers.
pub fn parse_number(text: &str) -> Option<Number> {
    let first = text.chars().next()?;
    if !(first.is_ascii_digit() || first == '-' || first == '+' || first == '.') {
        return None;
    }
    if !text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
    {
        return None;
    }
    if let Ok(i) = text.parse::<i64>() {
        return Some(Number::Integer(i));
    }
    text.parse::<f64>().ok().map(Number::Real)
}

impl Value {
    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::new(items))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }

    pub fn dict(entries: Vec<(String, Value)>) -> Self {
        Value::Dict(Rc::new(entries))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// String form, for values that have one
    pub fn as_text(&self) -> OutcomeResult<String> {
        match self {
            Value::Str(s) => Ok(s.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Real(r) => Ok(r.to_string()),
            Value::Script(script) => Ok(script.source().to_string()),
            _ => Err(Outcome::error("value has no string representation")),
        }
    }

    pub fn as_bool(&self) -> OutcomeResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Str(s) if &**s == "true" => Ok(true),
            Value::Str(s) if &**s == "false" => Ok(false),
            other => Err(Outcome::error(format!("invalid boolean \"{}\"", other))),
        }
    }

    pub fn as_integer(&self) -> OutcomeResult<i64> {
        match self {
            Value::Integer(i) => Ok(*i),
            Value::Real(r) if r.fract() == 0.0 => Ok(*r as i64),
            Value::Str(s) => s
                .parse::<i64>()
                .map_err(|_| Outcome::error(format!("invalid integer \"{}\"", s))),
            other => Err(Outcome::error(format!("invalid integer \"{}\"", other))),
        }
    }

    pub fn as_number(&self) -> OutcomeResult<Number> {
        match self {
            Value::Integer(i) => Ok(Number::Integer(*i)),
            Value::Real(r) => Ok(Number::Real(*r)),
            Value::Str(s) => {
                parse_number(s).ok_or_else(|| Outcome::error(format!("invalid number \"{}\"", s)))
            }
            other => Err(Outcome::error(format!("invalid number \"{}\"", other))),
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Elements of a list, or of a tuple read as a list
    pub fn as_list(&self) -> OutcomeResult<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Ok(items),
            other => Err(Outcome::error(format!("invalid list \"{}\"", other))),
        }
    }
}

/* ===================== Conversions ===================== */

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

impl From<ScriptValue> for Value {
    fn from(script: ScriptValue) -> Self {
        Value::Script(Rc::new(script))
    }
}

/* ===================== Equality ===================== */

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Script(a), Value::Script(b)) => a.source() == b.source(),
            (Value::Command(a), Value::Command(b)) => Rc::ptr_eq(a, b),
            (Value::Continuation(a), Value::Continuation(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/* ===================== Display ===================== */

fn write_word(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Str(s) if s.is_empty() || s.chars().any(char::is_whitespace) => {
            write!(f, "\"{}\"", s)
        }
        other => write!(f, "{}", other),
    }
}

fn write_words(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    f.write_str("(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write_word(f, item)?;
    }
    f.write_str(")")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("[]"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[list ")?;
                write_words(f, items)?;
                f.write_str("]")
            }
            Value::Dict(entries) => {
                f.write_str("[dict (")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write_word(f, &Value::from(key.as_str()))?;
                    f.write_str(" ")?;
                    write_word(f, value)?;
                }
                f.write_str(")]")
            }
            Value::Tuple(items) => write_words(f, items),
            Value::Script(script) => write!(f, "{{{}}}", script.source()),
            Value::Command(_) => f.write_str("[command]"),
            Value::Continuation(_) => f.write_str("[continuation]"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

/* ===================== Serialization ===================== */

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(r) => serializer.serialize_f64(*r),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) | Value::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dict(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            other => serializer.collect_str(other),
        }
    }
}

/* ===================== Scripts ===================== */

/// Script value: an unevaluated block and its lazily compiled program
pub struct ScriptValue {
    source: String,
    script: Script,
    source_name: Option<Rc<str>>,
    program: OnceCell<Rc<Program>>,
}

impl ScriptValue {
    pub fn new(source: impl Into<String>, script: Script) -> Self {
        Self {
            source: source.into(),
            script,
            source_name: None,
            program: OnceCell::new(),
        }
    }

    pub fn with_source_name(mut self, source_name: Option<Rc<str>>) -> Self {
        self.source_name = source_name;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Compiled program, compiled on first use
    pub fn program(&self) -> Rc<Program> {
        self.program
            .get_or_init(|| {
                Rc::new(Compiler::new(self.source_name.clone()).compile(&self.script))
            })
            .clone()
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        let tuple = Value::tuple(vec![Value::from("a"), Value::Integer(1)]);
        assert_eq!(tuple.to_string(), "(a 1)");
        assert_eq!(Value::list(vec![Value::from("a"), Value::from("b c")]).to_string(), "[list (a \"b c\")]");
        assert_eq!(
            Value::dict(vec![("k".to_string(), Value::from("v"))]).to_string(),
            "[dict (k v)]"
        );
        assert_eq!(Value::Nil.to_string(), "[]");
    }

    #[test]
    fn test_coercions() {
        assert_eq!(Value::from("true").as_bool(), Ok(true));
        assert_eq!(
            Value::from("yes").as_bool(),
            Err(Outcome::error("invalid boolean \"yes\""))
        );
        assert_eq!(Value::from("12").as_integer(), Ok(12));
        assert_eq!(
            Value::from("1x").as_integer(),
            Err(Outcome::error("invalid integer \"1x\""))
        );
        assert_eq!(Value::from("1.5").as_number(), Ok(Number::Real(1.5)));
        assert_eq!(
            Value::from("nan").as_number(),
            Err(Outcome::error("invalid number \"nan\""))
        );
        assert_eq!(
            Value::tuple(vec![]).as_text(),
            Err(Outcome::error("value has no string representation"))
        );
    }

    #[test]
    fn test_parse_number_rejects_names() {
        assert_eq!(parse_number("42"), Some(Number::Integer(42)));
        assert_eq!(parse_number("-2.5"), Some(Number::Real(-2.5)));
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("1a"), None);
    }
}
