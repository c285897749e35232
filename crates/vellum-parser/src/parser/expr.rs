//! Expression parser using Pratt parsing (precedence climbing).
//!
//! ## Precedence Levels (lowest to highest)
//!
//! 1. `||` (Or)
//! 2. `&&` (And)
//! 3. `==`, `!=`, `<`, `<=`, `>`, `>=` (Comparison)
//! 4. `+`, `-` (Addition)
//! 5. `*`, `/`, `%` (Multiplication)
//! 6. Postfix: `.field`, `.method(args)`
//!
//! All binary operators are left associative.

use vellum_ast::{BinaryOp, Expr, Literal, Selector, Step};
use vellum_lexer::Token;

use super::{ParseError, TokenStream};

/// Binary operator metadata: (precedence, op). Higher binds tighter.
fn binary_op_info(token: &Token) -> Option<(u8, BinaryOp)> {
    match token {
        Token::Or => Some((10, BinaryOp::Or)),
        Token::And => Some((20, BinaryOp::And)),
        Token::EqEq => Some((30, BinaryOp::Eq)),
        Token::BangEq => Some((30, BinaryOp::Ne)),
        Token::Lt => Some((30, BinaryOp::Lt)),
        Token::LtEq => Some((30, BinaryOp::Le)),
        Token::Gt => Some((30, BinaryOp::Gt)),
        Token::GtEq => Some((30, BinaryOp::Ge)),
        Token::Plus => Some((40, BinaryOp::Add)),
        Token::Minus => Some((40, BinaryOp::Sub)),
        Token::Star => Some((50, BinaryOp::Mul)),
        Token::Slash => Some((50, BinaryOp::Div)),
        Token::Percent => Some((50, BinaryOp::Mod)),
        _ => None,
    }
}

/// Parse an expression.
pub(super) fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    parse_pratt(stream, 0)
}

fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let mut left = parse_prefix(stream)?;

    while let Some((prec, op)) = stream.peek().and_then(binary_op_info) {
        if prec < min_prec {
            break;
        }
        stream.advance();
        let right = parse_pratt(stream, prec + 1)?;
        left = Expr::binary(op, left, right);
    }

    Ok(left)
}

/// Unary minus folds into numeric literals; there is no unary operator node.
fn parse_prefix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    if !stream.check(&Token::Minus) {
        return parse_atom(stream);
    }

    let start = stream.current_pos();
    stream.advance();
    let span = stream.current_span();
    let literal = match stream.advance() {
        Some(Token::Integer(n)) => Literal::Int(-n),
        Some(Token::Float(n)) => Literal::Float(-n),
        other => {
            return Err(ParseError::invalid_syntax(
                format!(
                    "unary `-` applies only to numeric literals, found {}",
                    other.map_or_else(|| "end of input".to_string(), |t| format!("`{t}`"))
                ),
                span,
            ));
        }
    };
    Ok(Expr::literal(literal, stream.span_from(start)))
}

fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let span = stream.current_span();

    match stream.advance() {
        Some(Token::Integer(n)) => Ok(Expr::literal(Literal::Int(*n), span)),
        Some(Token::Float(n)) => Ok(Expr::literal(Literal::Float(*n), span)),
        Some(Token::String(s)) => Ok(Expr::literal(Literal::Str(s.to_string()), span)),
        Some(Token::True) => Ok(Expr::literal(Literal::Bool(true), span)),
        Some(Token::False) => Ok(Expr::literal(Literal::Bool(false), span)),
        Some(Token::LParen) => {
            let inner = parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            Ok(Expr::parentheses(inner, stream.span_from(start)))
        }
        Some(Token::Evaluate) => {
            stream.expect(Token::LParen)?;
            let inner = parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            Ok(Expr::evaluate(inner, stream.span_from(start)))
        }
        Some(Token::Ident(id)) => {
            if stream.check(&Token::LParen) {
                return Err(ParseError::invalid_syntax(
                    format!("function `{id}` must be called on a receiver, e.g. `x.{id}()`"),
                    span,
                ));
            }
            let selector = parse_steps(stream, Selector::new(id.to_string()))?;
            Ok(Expr::select(selector, stream.span_from(start)))
        }
        other => Err(ParseError::unexpected_token(other, "in expression", span)),
    }
}

/// Parse `.field` and `.method(args)` steps after a root identifier.
fn parse_steps(stream: &mut TokenStream, mut selector: Selector) -> Result<Selector, ParseError> {
    while stream.check(&Token::Dot) {
        stream.advance();
        let span = stream.current_span();
        let name = match stream.advance() {
            Some(Token::Ident(s)) => s.to_string(),
            Some(token) => match token.as_str() {
                // keywords are valid member names after a dot
                Some(word) if word.chars().all(|c| c.is_ascii_alphabetic()) => word.to_string(),
                _ => return Err(ParseError::unexpected_token(Some(token), "after `.`", span)),
            },
            None => return Err(ParseError::unexpected_token(None, "after `.`", span)),
        };

        if stream.check(&Token::LParen) {
            let args = parse_call_args(stream)?;
            selector.steps.push(Step::call(name, args));
        } else {
            selector.steps.push(Step::field(name));
        }
    }
    Ok(selector)
}

fn parse_call_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(Token::LParen)?;

    let mut args = Vec::new();
    while !stream.check(&Token::RParen) {
        if stream.at_end() {
            return Err(ParseError::expected_token(
                Token::RParen,
                None,
                stream.current_span(),
            ));
        }
        args.push(parse_expr(stream)?);

        if !stream.check(&Token::RParen) {
            stream.expect(Token::Comma)?;
        }
    }

    stream.expect(Token::RParen)?;
    Ok(args)
}
