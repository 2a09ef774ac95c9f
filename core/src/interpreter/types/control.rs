//! Result codes and outcomes
//!
//! Every operation in the interpreter returns an [`Outcome`]: a result code, a
//! value, and optional data. Failures are data, never Rust errors.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::error_stack::ErrorStack;
use super::values::Value;
use crate::interpreter::process::ContinuationValue;

/* ===================== Result Codes ===================== */

/// Tag identifying a result code outside the fixed set
///
/// Custom codes compare by identity: two tags with the same name are still
/// distinct codes. Declare them as `static` items and refer to them by address.
#[derive(Debug)]
pub struct CustomCode {
    name: &'static str,
}

impl CustomCode {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// How a computation ended
#[derive(Debug, Clone, Copy)]
pub enum ResultCode {
    Ok,
    Return,
    Yield,
    Error,
    Break,
    Continue,
    Custom(&'static CustomCode),
}

impl ResultCode {
    pub fn name(&self) -> &'static str {
        match self {
            ResultCode::Ok => "ok",
            ResultCode::Return => "return",
            ResultCode::Yield => "yield",
            ResultCode::Error => "error",
            ResultCode::Break => "break",
            ResultCode::Continue => "continue",
            ResultCode::Custom(code) => code.name(),
        }
    }
}

impl PartialEq for ResultCode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResultCode::Custom(a), ResultCode::Custom(b)) => std::ptr::eq(*a, *b),
            (ResultCode::Custom(_), _) | (_, ResultCode::Custom(_)) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Eq for ResultCode {}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/* ===================== Result Data ===================== */

/// Auxiliary data carried by an outcome
///
/// A `Token` is the opaque resumption state of a suspended command; only the
/// command that issued it knows how to read it. An `ErrorStack` is attached to
/// ERROR outcomes by processes that capture error stacks.
#[derive(Clone)]
pub enum ResultData {
    Token(Rc<dyn Any>),
    ErrorStack(Rc<ErrorStack>),
}

impl fmt::Debug for ResultData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultData::Token(_) => f.write_str("Token(..)"),
            ResultData::ErrorStack(stack) => f.debug_tuple("ErrorStack").field(stack).finish(),
        }
    }
}

/* ===================== Outcome ===================== */

/// Tagged result of every operation
///
/// Equality compares code and value only; attached data is ignored.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub code: ResultCode,
    pub value: Value,
    pub data: Option<ResultData>,
}

impl Outcome {
    pub fn new(code: ResultCode, value: Value) -> Self {
        Self {
            code,
            value,
            data: None,
        }
    }

    pub fn ok(value: Value) -> Self {
        Self::new(ResultCode::Ok, value)
    }

    pub fn return_(value: Value) -> Self {
        Self::new(ResultCode::Return, value)
    }

    pub fn yield_(value: Value) -> Self {
        Self::new(ResultCode::Yield, value)
    }

    /// YIELD carrying a resumption token for the issuing command's `resume`
    pub fn yield_with(value: Value, token: Rc<dyn Any>) -> Self {
        Self {
            code: ResultCode::Yield,
            value,
            data: Some(ResultData::Token(token)),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ResultCode::Error, Value::from(message.into()))
    }

    pub fn break_() -> Self {
        Self::new(ResultCode::Break, Value::Nil)
    }

    pub fn continue_() -> Self {
        Self::new(ResultCode::Continue, Value::Nil)
    }

    pub fn custom(code: &'static CustomCode, value: Value) -> Self {
        Self::new(ResultCode::Custom(code), value)
    }

    pub fn is_ok(&self) -> bool {
        self.code == ResultCode::Ok
    }

    /// The continuation this outcome asks the trampoline to run, if any
    pub fn continuation(&self) -> Option<Rc<ContinuationValue>> {
        match &self.value {
            Value::Continuation(continuation) => Some(continuation.clone()),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&Rc<dyn Any>> {
        match &self.data {
            Some(ResultData::Token(token)) => Some(token),
            _ => None,
        }
    }

    pub fn error_stack(&self) -> Option<&ErrorStack> {
        match &self.data {
            Some(ResultData::ErrorStack(stack)) => Some(stack),
            _ => None,
        }
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Outcome::ok(Value::Nil)
    }
}

impl PartialEq for Outcome {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.value == other.value
    }
}

/// Result type for helpers whose failure is itself an outcome
///
/// Command implementations use it internally so that `?` can short-circuit
/// with an ERROR (or any other) outcome.
pub type OutcomeResult<T> = Result<T, Outcome>;

/// Marker code consumed by `catch` handlers to restore the caught result
pub static PASS: CustomCode = CustomCode::new("pass");
