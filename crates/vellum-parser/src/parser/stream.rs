//! Token stream wrapper for hand-written parser.

use std::ops::Range;
use vellum_ast::Span;
use vellum_lexer::Token;

/// Token stream with lookahead and position tracking.
///
/// Each token is paired with its absolute byte span in the template text.
pub struct TokenStream<'src> {
    tokens: &'src [(Token, Range<usize>)],
    pos: usize,
    /// Byte offset reported for errors at end of input.
    eof: usize,
}

impl<'src> TokenStream<'src> {
    pub fn new(tokens: &'src [(Token, Range<usize>)], eof: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            eof,
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&'src Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    /// Advance to the next token and return the current one.
    pub fn advance(&mut self) -> Option<&'src Token> {
        let token = self.tokens.get(self.pos).map(|(tok, _)| tok);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches the expected token kind.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Expect a specific token and advance if it matches.
    pub fn expect(&mut self, expected: Token) -> Result<Span, super::ParseError> {
        if self.check(&expected) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(super::ParseError::expected_token(
                expected,
                self.peek(),
                self.current_span(),
            ))
        }
    }

    /// Fail unless every token has been consumed.
    pub fn expect_end(&self) -> Result<(), super::ParseError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(super::ParseError::unexpected_token(
                self.peek(),
                "after expression",
                self.current_span(),
            ))
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn current_pos(&self) -> usize {
        self.pos
    }

    /// Span from the token at `start` to the last consumed token.
    pub fn span_from(&self, start: usize) -> Span {
        let start_byte = self
            .tokens
            .get(start)
            .map(|(_, span)| span.start)
            .unwrap_or(self.eof);
        let end_byte = self
            .pos
            .checked_sub(1)
            .and_then(|last| self.tokens.get(last))
            .map(|(_, span)| span.end)
            .unwrap_or(start_byte);
        Span::new(start_byte as u32, end_byte.max(start_byte) as u32)
    }

    /// Span of the current token, or an empty span at end of input.
    pub fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, span)) => Span::new(span.start as u32, span.end as u32),
            None => {
                let end = self.tokens.last().map(|(_, s)| s.end).unwrap_or(self.eof);
                Span::new(end as u32, end as u32)
            }
        }
    }
}
