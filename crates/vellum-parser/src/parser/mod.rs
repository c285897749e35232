//! Template and expression parsing.
//!
//! ## Architecture
//!
//! - `stream`: TokenStream wrapper with lookahead
//! - `error`: ParseError and its kinds
//! - `template`: splits literal text from `{{ … }}` interpolations
//! - `expr`: expression parser using Pratt parsing
//!
//! ## Public API
//!
//! ```rust,ignore
//! pub fn parse(source: &str) -> Result<Block, ParseError>
//! pub fn parse_expr(source: &str) -> Result<Expr, ParseError>
//! ```

mod error;
mod expr;
mod stream;
mod template;

pub use error::{ParseError, ParseErrorKind};
use stream::TokenStream;

use vellum_ast::{Block, Expr};

/// Parse template text into a block of statements.
///
/// # Errors
///
/// Fails on an unterminated `{{`, a character the lexer does not accept,
/// or an interpolation that is not exactly one well-formed expression.
pub fn parse(source: &str) -> Result<Block, ParseError> {
    template::parse_template(source)
}

/// Parse a bare expression, without surrounding braces.
pub fn parse_expr(source: &str) -> Result<Expr, ParseError> {
    let tokens = template::lex_all(source)?;
    let mut stream = TokenStream::new(&tokens, source.len());
    let expr = expr::parse_expr(&mut stream)?;
    stream.expect_end()?;
    Ok(expr)
}
