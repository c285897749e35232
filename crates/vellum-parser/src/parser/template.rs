//! Splitting template text into literal runs and interpolations.

use logos::Logos;
use std::ops::Range;
use vellum_ast::{Block, Span, Stmt};
use vellum_lexer::Token;

use super::{ParseError, TokenStream, expr};

const OPEN: &str = "{{";

pub(super) fn parse_template(source: &str) -> Result<Block, ParseError> {
    let mut block = Block::new();
    let mut pos = 0;

    while let Some(rel) = source[pos..].find(OPEN) {
        let open = pos + rel;
        if open > pos {
            block.add_statement(Stmt::Text(source[pos..open].to_string()));
        }

        let body_start = open + OPEN.len();
        let (tokens, close_end) = lex_interpolation(source, body_start)?;
        let mut stream = TokenStream::new(&tokens, close_end);
        let expr = expr::parse_expr(&mut stream)?;
        stream.expect_end()?;
        block.add_statement(Stmt::Output(expr));

        pos = close_end;
    }

    if pos < source.len() {
        block.add_statement(Stmt::Text(source[pos..].to_string()));
    }
    Ok(block)
}

/// Lex from `start` up to the first `}}` token.
///
/// Returns the tokens (the close excluded) with absolute spans, and the
/// byte offset just past the close.
fn lex_interpolation(
    source: &str,
    start: usize,
) -> Result<(Vec<(Token, Range<usize>)>, usize), ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(&source[start..]);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let absolute = start + span.start..start + span.end;
        match result {
            Ok(Token::Close) => return Ok((tokens, absolute.end)),
            Ok(token) => tokens.push((token, absolute)),
            Err(()) => {
                return Err(ParseError::invalid_character(
                    lexer.slice(),
                    Span::new(absolute.start as u32, absolute.end as u32),
                ));
            }
        }
    }

    let open = start - OPEN.len();
    Err(ParseError::unterminated(Span::new(
        open as u32,
        source.len() as u32,
    )))
}

/// Lex a whole bare expression.
pub(super) fn lex_all(source: &str) -> Result<Vec<(Token, Range<usize>)>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                return Err(ParseError::invalid_character(
                    lexer.slice(),
                    Span::new(span.start as u32, span.end as u32),
                ));
            }
        }
    }
    Ok(tokens)
}
