//! Runtime errors

use thiserror::Error;

/// Runtime result type
pub type Result<T> = std::result::Result<T, Error>;

/// Runtime errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("variable {0} not found")]
    UnknownVariable(String),

    #[error("field {0} already defined")]
    DuplicateField(String),

    #[error("unknown field {field} on {ty}")]
    UnknownField { field: String, ty: String },

    #[error("type mismatch for {id}: expected {expected}, found {found}")]
    TypeMismatch {
        id: String,
        expected: String,
        found: String,
    },

    #[error("unsupported {op} use on {ty}")]
    Unsupported { op: String, ty: String },
}
