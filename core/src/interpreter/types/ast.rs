//! AST node types
//!
//! A script is a list of sentences; a sentence is a list of words; a word is a
//! list of morphemes. Words with more than one morpheme are compound words whose
//! value is the concatenation of their parts.

use serde::{Deserialize, Serialize};

/// Location of a sentence in its source text
///
/// `index` is a byte offset; `line` and `column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub sentences: Vec<Sentence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub words: Vec<Word>,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub morphemes: Vec<Morpheme>,
}

impl Word {
    /// Literal text of a word made of a single literal morpheme
    pub fn as_literal(&self) -> Option<&str> {
        match self.morphemes.as_slice() {
            [Morpheme::Literal { value }] => Some(value),
            _ => None,
        }
    }
}

/// Word building block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Morpheme {
    /// Plain text, escapes already decoded
    Literal { value: String },

    /// `{...}`: nested script kept unevaluated, with its source text
    Block { source: String, script: Script },

    /// `(...)`: words evaluated into a tuple
    Tuple { words: Vec<Word> },

    /// `[...]`: nested script evaluated in place; its last result is the value
    Expression { script: Script },

    /// `"..."`: parts joined into a single string
    String { parts: Vec<Morpheme> },

    /// `$source`, resolved `levels` times
    Substitution {
        levels: usize,
        source: SubstitutionSource,
    },
}

/// What a `$` substitution resolves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum SubstitutionSource {
    /// `$name` or `${name}`
    Name { name: String },
    /// `$(a b)`: each element resolved
    Tuple { words: Vec<Word> },
    /// `$[expr]`: the expression result resolved
    Expression { script: Script },
}
