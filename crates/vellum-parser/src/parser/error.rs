//! Parse error types.

use std::fmt;
use vellum_ast::Span;
use vellum_lexer::Token;

/// Parse error with source location and context.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Kind of parse error
    pub kind: ParseErrorKind,
    /// Source location where error occurred
    pub span: Span,
    /// Human-readable error message
    pub message: String,
}

/// Category of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A token was found where a different one was expected.
    UnexpectedToken,

    /// Input ended in the middle of an expression.
    UnexpectedEof,

    /// `{{` without a matching `}}`.
    Unterminated,

    /// A character sequence the lexer does not recognize, including
    /// malformed string escapes and integer overflow.
    InvalidCharacter,

    /// Tokens are well-formed but the construct is not part of the language,
    /// e.g. a function call without a receiver.
    InvalidSyntax,
}

impl ParseError {
    /// Create an "expected token" error.
    pub fn expected_token(expected: Token, found: Option<&Token>, span: Span) -> Self {
        let message = match found {
            Some(token) => format!("expected `{}`, found `{}`", expected, token),
            None => format!("expected `{}`, found end of input", expected),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(found: Option<&Token>, context: &str, span: Span) -> Self {
        let message = match found {
            Some(token) => format!("unexpected `{}` {}", token, context),
            None => format!("unexpected end of input {}", context),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    pub fn unterminated(span: Span) -> Self {
        Self {
            kind: ParseErrorKind::Unterminated,
            span,
            message: "unterminated `{{`, missing `}}`".to_string(),
        }
    }

    pub fn invalid_character(text: &str, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::InvalidCharacter,
            span,
            message: format!("invalid input `{}`", text),
        }
    }

    /// Create an "invalid syntax" error.
    pub fn invalid_syntax(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::InvalidSyntax,
            span,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

impl std::error::Error for ParseError {}
