//! Error kinds produced while assembling, and the per-line diagnostics
//! that carry them.
use std::fmt;

use thiserror::Error;

use super::ast::Mnemonic;

/// A line that does not match the grammar at all.
#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum SyntaxError {
    #[error("`:` must directly follow a label name")]
    StrayColon,
    #[error("label names may only contain the letters A-Z, got `{0}`")]
    InvalidLabel(String),
    #[error("only one label may be declared per line, got a second `{0}:`")]
    SecondLabel(String),
    #[error("unknown mnemonic `{0}`")]
    UnknownMnemonic(String),
    #[error("literal `{0}` may only appear as the first operand")]
    MisplacedLiteral(i16),
    #[error("unexpected {0}")]
    UnexpectedToken(String),
}

#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum AsmError {
    #[error("invalid line: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("invalid operand to {0}")]
    InvalidOperand(Mnemonic),
    #[error("{0} requires a destination register")]
    MissingDestination(Mnemonic),
    #[error("{0} requires a label name")]
    MissingTarget(Mnemonic),
    #[error("numeric literal `{value}` cannot be a jump target for {mnemonic}")]
    LiteralTarget { mnemonic: Mnemonic, value: i16 },
    #[error("label {name} already defined on line {first_line}")]
    DuplicateLabel { name: String, first_line: usize },
    #[error("label {0} not found")]
    UndefinedLabel(String),
    #[error("label {name} at offset {offset} does not fit in a jump target byte")]
    LabelOutOfRange { name: String, offset: usize },
    #[error("program is larger than the {limit}-byte ROM")]
    ImageTooLarge { limit: usize },
}

/// An error tagged with the source it came from and its 1-based line.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    pub source: String,
    pub line:   usize,
    pub error:  AsmError,
}

impl Diagnostic {
    pub fn new(source: &str, line: usize, error: AsmError) -> Self {
        Diagnostic { source: source.to_string(), line, error }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}: {}", self.source, self.line, self.error)
    }
}

impl std::error::Error for Diagnostic {}
