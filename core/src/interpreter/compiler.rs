//! Script compiler
//!
//! Flattens a script AST into a linear opcode program for the executor. Blocks
//! become script constants compiled on first use, so a body is compiled once no
//! matter how many times it runs.

use std::rc::Rc;

use super::types::ast::{Morpheme, Script, Sentence, SourcePosition, SubstitutionSource, Word};
use super::types::values::{ScriptValue, Value};

/* ===================== Program ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    PushNil,
    /// Push the constant at this index
    PushConstant(usize),
    OpenFrame,
    /// Collect everything pushed since the matching `OpenFrame` into a tuple
    CloseFrame,
    /// Replace the top value with the variable it names (elementwise for tuples)
    ResolveValue,
    /// Pop a tuple of words and evaluate it as a command; operand indexes positions
    EvaluateSentence(Option<usize>),
    PushResult,
    /// Replace the top tuple with the concatenation of its string forms
    JoinStrings,
}

/// Immutable compiled form of a script
#[derive(Debug, Default)]
pub struct Program {
    pub(crate) opcodes: Vec<OpCode>,
    pub(crate) constants: Vec<Value>,
    pub(crate) positions: Vec<SourcePosition>,
    pub(crate) source: Option<Rc<str>>,
}

impl Program {
    pub fn opcodes(&self) -> &[OpCode] {
        &self.opcodes
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    /// Name of the source this program was compiled from
    pub fn source(&self) -> Option<&Rc<str>> {
        self.source.as_ref()
    }
}

/* ===================== Compiler ===================== */

pub struct Compiler {
    source: Option<Rc<str>>,
    program: Program,
}

impl Compiler {
    pub fn new(source: Option<Rc<str>>) -> Self {
        Self {
            program: Program {
                source: source.clone(),
                ..Program::default()
            },
            source,
        }
    }

    pub fn compile(mut self, script: &Script) -> Program {
        self.emit_script(script);
        self.program
    }

    /// Single-sentence program invoking already evaluated words
    pub fn compile_sentence(values: &[Value]) -> Program {
        let mut compiler = Compiler::new(None);
        compiler.emit(OpCode::OpenFrame);
        for value in values {
            compiler.emit_constant(value.clone());
        }
        compiler.emit(OpCode::CloseFrame);
        compiler.emit(OpCode::EvaluateSentence(None));
        compiler.program
    }

    fn emit(&mut self, opcode: OpCode) {
        self.program.opcodes.push(opcode);
    }

    fn emit_constant(&mut self, value: Value) {
        self.program.constants.push(value);
        let index = self.program.constants.len() - 1;
        self.emit(OpCode::PushConstant(index));
    }

    fn emit_script(&mut self, script: &Script) {
        for sentence in &script.sentences {
            self.emit_sentence(sentence);
        }
    }

    fn emit_sentence(&mut self, sentence: &Sentence) {
        self.emit(OpCode::OpenFrame);
        for word in &sentence.words {
            self.emit_word(word);
        }
        self.emit(OpCode::CloseFrame);
        self.program.positions.push(sentence.position);
        let position = self.program.positions.len() - 1;
        self.emit(OpCode::EvaluateSentence(Some(position)));
    }

    fn emit_words(&mut self, words: &[Word]) {
        self.emit(OpCode::OpenFrame);
        for word in words {
            self.emit_word(word);
        }
        self.emit(OpCode::CloseFrame);
    }

    fn emit_word(&mut self, word: &Word) {
        match word.morphemes.as_slice() {
            [morpheme] => self.emit_morpheme(morpheme),
            morphemes => self.emit_joined(morphemes),
        }
    }

    fn emit_joined(&mut self, morphemes: &[Morpheme]) {
        self.emit(OpCode::OpenFrame);
        for morpheme in morphemes {
            self.emit_morpheme(morpheme);
        }
        self.emit(OpCode::CloseFrame);
        self.emit(OpCode::JoinStrings);
    }

    fn emit_morpheme(&mut self, morpheme: &Morpheme) {
        match morpheme {
            Morpheme::Literal { value } => self.emit_constant(Value::from(value.as_str())),
            Morpheme::Block { source, script } => {
                let script = ScriptValue::new(source.as_str(), script.clone())
                    .with_source_name(self.source.clone());
                self.emit_constant(Value::from(script));
            }
            Morpheme::Tuple { words } => self.emit_words(words),
            Morpheme::Expression { script } => self.emit_expression(script),
            Morpheme::String { parts } => match parts.as_slice() {
                [] => self.emit_constant(Value::from("")),
                [Morpheme::Literal { value }] => self.emit_constant(Value::from(value.as_str())),
                parts => self.emit_joined(parts),
            },
            Morpheme::Substitution { levels, source } => {
                match source {
                    SubstitutionSource::Name { name } => {
                        self.emit_constant(Value::from(name.as_str()))
                    }
                    SubstitutionSource::Tuple { words } => self.emit_words(words),
                    SubstitutionSource::Expression { script } => self.emit_expression(script),
                }
                for _ in 0..*levels {
                    self.emit(OpCode::ResolveValue);
                }
            }
        }
    }

    fn emit_expression(&mut self, script: &Script) {
        if script.sentences.is_empty() {
            self.emit(OpCode::PushNil);
            return;
        }
        self.emit_script(script);
        self.emit(OpCode::PushResult);
    }
}
