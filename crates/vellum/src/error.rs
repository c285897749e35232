//! Compile and evaluation errors.

use thiserror::Error;
use vellum_parser::ParseError;

/// Compile result type
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors surfaced by variable registration and compilation.
///
/// Composite selector ids are rendered dot-joined.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("unknown variable {0}")]
    UnknownVariable(String),

    #[error("field {field} not found on {ty}")]
    FieldNotFound { field: String, ty: String },

    #[error("field {0} is omitted from templates")]
    FieldOmitted(String),

    #[error("selector {0} not found")]
    SelectorNotFound(String),

    #[error("unknown function {0}")]
    UnknownFunction(String),

    #[error("function {name} expects {expected} arguments, found {found}")]
    ArityMismatch {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("unsupported {op} use on {ty}")]
    Unsupported { op: String, ty: String },

    #[error("variable {0} already defined, use an explicit prefix")]
    Duplicate(String),

    #[error("empty selector id")]
    EmptySelectorId,

    #[error("empty selector type for {0}")]
    EmptySelectorType(String),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error(transparent)]
    Runtime(vellum_runtime::Error),
}

impl From<vellum_runtime::Error> for CompileError {
    fn from(err: vellum_runtime::Error) -> Self {
        match err {
            vellum_runtime::Error::Unsupported { op, ty } => CompileError::Unsupported { op, ty },
            vellum_runtime::Error::DuplicateField(id) => CompileError::Duplicate(id),
            other => CompileError::Runtime(other),
        }
    }
}

/// Reasons a dynamic sub-template degraded to an empty result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluateError {
    #[error("failed to parse dynamic template {text:?}: {source}")]
    Parse { text: String, source: ParseError },

    #[error("failed to compile dynamic template {text:?}: {source}")]
    Compile { text: String, source: CompileError },

    #[error("failed to bind {id} into dynamic template: {source}")]
    Bind {
        id: String,
        source: vellum_runtime::Error,
    },
}
