//! Type definitions for the interpreter
//!
//! This module contains all the core types used by the execution core:
//! - AST nodes (Script, Sentence, Word, Morpheme)
//! - Runtime values (Value, ScriptValue)
//! - Result codes and outcomes (ResultCode, Outcome)
//! - Error stacks and per-command phase tags

pub mod ast;
pub mod control;
pub mod error_stack;
pub mod phase;
pub mod values;

// Re-export all types for convenient access
pub use ast::{Morpheme, Script, Sentence, SourcePosition, SubstitutionSource, Word};
pub use control::{CustomCode, Outcome, OutcomeResult, ResultCode, ResultData, PASS};
pub use error_stack::{ErrorFrame, ErrorStack};
pub use phase::*;
pub use values::{parse_number, Number, ScriptValue, Value};
