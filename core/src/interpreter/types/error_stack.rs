//! Error stack traces
//!
//! When a process captures error stacks, every activation context an ERROR
//! unwinds through contributes one frame, innermost first.

use std::fmt;

use serde::Serialize;

use super::ast::SourcePosition;
use super::values::Value;

/// One level of an error stack
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorFrame {
    /// Words of the last command line evaluated at this level
    pub frame: Vec<Value>,
    /// Name of the source the program was compiled from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<SourcePosition>,
}

/// Innermost-first sequence of error frames
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ErrorStack {
    frames: Vec<ErrorFrame>,
}

impl ErrorStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: ErrorFrame) {
        self.frames.push(frame);
    }

    pub fn frames(&self) -> &[ErrorFrame] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl fmt::Display for ErrorFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at")?;
        for word in &self.frame {
            write!(f, " {}", word)?;
        }
        match (&self.source, &self.position) {
            (Some(source), Some(position)) => {
                write!(f, " ({}:{}:{})", source, position.line, position.column)
            }
            (None, Some(position)) => write!(f, " ({}:{})", position.line, position.column),
            (Some(source), None) => write!(f, " ({})", source),
            (None, None) => Ok(()),
        }
    }
}

impl fmt::Display for ErrorStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {}", frame)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_innermost_first() {
        let mut stack = ErrorStack::new();
        stack.push(ErrorFrame {
            frame: vec![Value::from("error"), Value::from("msg")],
            source: Some("main.hln".to_string()),
            position: Some(SourcePosition {
                index: 12,
                line: 2,
                column: 3,
            }),
        });
        stack.push(ErrorFrame {
            frame: vec![Value::from("cmd")],
            source: None,
            position: None,
        });

        assert_eq!(stack.depth(), 2);
        assert_eq!(
            stack.to_string(),
            "  at error msg (main.hln:2:3)\n  at cmd"
        );
    }
}
