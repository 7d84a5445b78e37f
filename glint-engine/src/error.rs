// Engine Errors
// Fatal failures that abort a compile or evaluate call

use crate::expression::lexer::LexError;

use thiserror::Error;

/// Errors that stop an expression from producing a value.
///
/// `compile` folds these into diagnostics; `evaluate` returns them as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unknown operation '{operation}' at {from}..{to}")]
    UnknownOperation {
        operation: String,
        from: usize,
        to: usize,
    },

    #[error("reserved keyword '{keyword}' at {from}..{to} cannot be used as a value")]
    ReservedKeyword {
        keyword: String,
        from: usize,
        to: usize,
    },

    #[error("malformed expression: {0}")]
    MalformedTree(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
