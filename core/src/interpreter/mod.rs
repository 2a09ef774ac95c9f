//! Helena execution core
//!
//! Source text is parsed into an AST, compiled into a [`Program`], and run by a
//! [`Process`]: a trampoline that keeps nested command invocations on an
//! explicit stack so execution can suspend on YIELD and resume later.

pub mod commands;
pub mod compiler;
pub mod executor;
pub mod parser;
pub mod pool;
pub mod process;
pub mod scope;
pub mod types;

#[cfg(test)]
mod tests;

pub use commands::Command;
pub use compiler::{Compiler, OpCode, Program};
pub use executor::{Executor, ProgramState};
pub use parser::{parse, ParseError};
pub use process::{
    yield_continuation, yield_continuation_with, yield_continuation_with_data, ContinuationValue,
    Process, ProcessOptions,
};
pub use scope::{destructure_value, Scope, ScopeRef};
pub use types::{
    CustomCode, ErrorFrame, ErrorStack, Outcome, ResultCode, ResultData, ScriptValue, Value, PASS,
};
