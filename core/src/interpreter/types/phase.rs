//! Execution phase enums for each suspendable command
//!
//! Each control-flow command keeps its own Phase enum in its pooled state so
//! that `resume` knows which nested program a resumed value belongs to.

/// Execution phase for `while`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(u8)]
pub enum WhilePhase {
    /// Evaluating the test script
    #[default]
    InTest = 0,
    /// Running the body
    InBody = 1,
}

/// Execution phase for `loop`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(u8)]
pub enum LoopPhase {
    /// Pulling the next value out of a script or command source
    #[default]
    InSource = 0,
    /// Running the body
    InBody = 1,
}

/// Execution phase for `when`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(u8)]
pub enum WhenPhase {
    /// Evaluating a script selector
    #[default]
    InSelector = 0,
    /// Evaluating a case test
    InTest = 1,
}

/// Execution phase for `catch`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(u8)]
pub enum CatchPhase {
    /// Running the guarded body
    #[default]
    InBody = 0,
    /// Running the handler matching the body's result
    InHandler = 1,
    /// Running the `finally` clause
    InFinally = 2,
}
