//! Error taxonomy. Parse errors and compile-time errors are both fatal and
//! both unwind to the driver without recovery — there is no runtime error
//! category, since this system emits code rather than executing it.

use std::fmt;

/// Raised by [`crate::combinators::parse_string_to_completion`] when the
/// grammar fails to consume the whole input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    AtIndex { index: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::AtIndex { index } => write!(f, "Parse error at index {index}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Raised during code generation. Folds parse errors in as a variant so the
/// public `compile` entry point has a single `Result` error type to
/// propagate with `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    Parse(ParseError),
    UndefinedVariable { name: String },
    TooManyArguments,
    TooManyParams,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse(e) => write!(f, "{e}"),
            CompileError::UndefinedVariable { name } => {
                write!(f, "Undefined variable: {name}")
            }
            CompileError::TooManyArguments => {
                write!(f, "More than 4 arguments are not supported")
            }
            CompileError::TooManyParams => {
                write!(f, "More than 4 params is not supported")
            }
        }
    }
}

impl std::error::Error for CompileError {}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}
