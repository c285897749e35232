//! Hand-written recursive descent parser for Vellum templates
//!
//! A template is literal text with `{{ expr }}` interpolations. The parser
//! splits the text, lexes each interpolation up to its closing `}}`, and
//! parses the tokens with a small Pratt parser.

pub mod parser;

pub use parser::{ParseError, ParseErrorKind, parse, parse_expr};

// Re-export lexer
pub use vellum_lexer::Token;
