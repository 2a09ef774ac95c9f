//! PEST-based parser for Helena scripts
//!
//! Produces the AST consumed by the compiler.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use super::types::ast::{Morpheme, Script, Sentence, SourcePosition, SubstitutionSource, Word};


/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "interpreter/parser/helena.pest"]
struct HelenaParser;

/* ===================== Error Types ===================== */

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let (line, column) = match err.line_col {
            pest::error::LineColLocation::Pos(pos) => pos,
            pest::error::LineColLocation::Span(start, _) => start,
        };
        ParseError::Syntax {
            line,
            column,
            message: err.variant.message().into_owned(),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

fn build_error(pair: &Pair<Rule>, message: impl Into<String>) -> ParseError {
    let (line, column) = pair.as_span().start_pos().line_col();
    ParseError::Syntax {
        line,
        column,
        message: message.into(),
    }
}

/* ===================== Public API ===================== */

/// Parse Helena source text into a script
pub fn parse(source: &str) -> ParseResult<Script> {
    let mut pairs = HelenaParser::parse(Rule::program, source)?;
    let program = pairs.next().ok_or_else(|| ParseError::Syntax {
        line: 1,
        column: 1,
        message: "empty parse".to_string(),
    })?;

    // program = { SOI ~ script ~ EOI }
    match program.into_inner().find(|p| p.as_rule() == Rule::script) {
        Some(script) => build_script(script),
        None => Ok(Script::default()),
    }
}

/* ===================== AST Builder ===================== */

fn build_script(pair: Pair<Rule>) -> ParseResult<Script> {
    // script = { (blank | sentence_sep | comment | sentence)* }
    let sentences = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::sentence)
        .map(build_sentence)
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Script { sentences })
}

fn build_sentence(pair: Pair<Rule>) -> ParseResult<Sentence> {
    let start = pair.as_span().start_pos();
    let (line, column) = start.line_col();
    let position = SourcePosition {
        index: start.pos(),
        line,
        column,
    };
    let words = pair
        .into_inner()
        .map(build_word)
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Sentence { words, position })
}

fn build_words(pair: Pair<Rule>) -> ParseResult<Vec<Word>> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::word)
        .map(build_word)
        .collect()
}

fn build_word(pair: Pair<Rule>) -> ParseResult<Word> {
    let morphemes = pair
        .into_inner()
        .map(build_morpheme)
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Word { morphemes })
}

fn build_morpheme(pair: Pair<Rule>) -> ParseResult<Morpheme> {
    match pair.as_rule() {
        Rule::literal => Ok(Morpheme::Literal {
            value: build_text(pair),
        }),
        Rule::lone_dollar => Ok(Morpheme::Literal {
            value: "$".to_string(),
        }),
        Rule::block => {
            let inner = first_inner(&pair, "block")?;
            Ok(Morpheme::Block {
                source: inner.as_str().to_string(),
                script: build_script(inner)?,
            })
        }
        Rule::tuple => Ok(Morpheme::Tuple {
            words: build_words(pair)?,
        }),
        Rule::expression => {
            let inner = first_inner(&pair, "expression")?;
            Ok(Morpheme::Expression {
                script: build_script(inner)?,
            })
        }
        Rule::string => build_string(pair),
        Rule::substitution => build_substitution(pair),
        rule => Err(build_error(&pair, format!("unexpected morpheme: {:?}", rule))),
    }
}

fn build_string(pair: Pair<Rule>) -> ParseResult<Morpheme> {
    // string = { "\"" ~ (string_text | escape | substitution | expression | lone_dollar)* ~ "\"" }
    let mut parts: Vec<Morpheme> = Vec::new();
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::string_text | Rule::escape | Rule::lone_dollar => {
                let text = match part.as_rule() {
                    Rule::escape => decode_escape(part.as_str()),
                    _ => part.as_str().to_string(),
                };
                // Adjacent text runs merge into one literal
                if let Some(Morpheme::Literal { value }) = parts.last_mut() {
                    value.push_str(&text);
                } else {
                    parts.push(Morpheme::Literal { value: text });
                }
            }
            _ => parts.push(build_morpheme(part)?),
        }
    }
    Ok(Morpheme::String { parts })
}

fn build_substitution(pair: Pair<Rule>) -> ParseResult<Morpheme> {
    // substitution = { dollars ~ (braced_name | tuple | expression | var_name) }
    let mut inner = pair.clone().into_inner();
    let (Some(dollars), Some(source)) = (inner.next(), inner.next()) else {
        return Err(build_error(&pair, "incomplete substitution"));
    };
    let levels = dollars.as_str().len();
    let source = match source.as_rule() {
        Rule::var_name => SubstitutionSource::Name {
            name: source.as_str().to_string(),
        },
        Rule::braced_name => SubstitutionSource::Name {
            name: first_inner(&source, "braced name")?.as_str().to_string(),
        },
        Rule::tuple => SubstitutionSource::Tuple {
            words: build_words(source)?,
        },
        Rule::expression => SubstitutionSource::Expression {
            script: build_script(first_inner(&source, "expression")?)?,
        },
        rule => {
            return Err(build_error(
                &source,
                format!("unexpected substitution source: {:?}", rule),
            ))
        }
    };
    Ok(Morpheme::Substitution { levels, source })
}

fn first_inner<'i>(pair: &Pair<'i, Rule>, what: &str) -> ParseResult<Pair<'i, Rule>> {
    pair.clone()
        .into_inner()
        .next()
        .ok_or_else(|| build_error(pair, format!("empty {}", what)))
}

/// Literal text with escapes decoded
fn build_text(pair: Pair<Rule>) -> String {
    let mut text = String::new();
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::escape => text.push_str(&decode_escape(part.as_str())),
            _ => text.push_str(part.as_str()),
        }
    }
    text
}

fn decode_escape(escape: &str) -> String {
    let mut chars = escape.chars();
    chars.next(); // backslash
    match chars.next() {
        Some('n') => "\n".to_string(),
        Some('t') => "\t".to_string(),
        Some('r') => "\r".to_string(),
        Some(c) => c.to_string(),
        None => String::new(),
    }
}
