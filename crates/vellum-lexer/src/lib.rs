// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for Vellum interpolations.
//!
//! Only the text between `{{` and `}}` is tokenized; literal template text
//! is split off by the parser before lexing. The closing `}}` is itself a
//! token so the parser can lex forward from an opening brace and stop at
//! the first close that is not inside a string literal.
//!
//! # Examples
//!
//! ```
//! # use vellum_lexer::Token;
//! # use logos::Logos;
//! let tokens: Vec<Result<Token, ()>> = Token::lexer("user.name + 1 }}").collect();
//! assert_eq!(tokens.len(), 6);
//! ```

use logos::Logos;
use std::fmt;
use std::rc::Rc;

/// Interpolation token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // === Keywords ===
    /// Keyword `true`
    #[token("true")]
    True,
    /// Keyword `false`
    #[token("false")]
    False,
    /// Keyword `evaluate`, the dynamic sub-template form
    #[token("evaluate")]
    Evaluate,

    // === Operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    And,
    #[token("||")]
    Or,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    /// End of an interpolation, `}}`
    #[token("}}")]
    Close,

    // === Literals ===
    /// Integer literal. Overflow surfaces as a lexer error.
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    /// Float literal (e.g., 3.14, 1.0, 5.67e-8)
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    /// String literal, double-quoted, escapes resolved
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        let content = &s[1..s.len() - 1];
        unescape_string(content).map(|s| Rc::from(s.as_str()))
    })]
    String(Rc<str>),

    /// Identifier. Dotted paths are sequences of Ident separated by Dot.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| Rc::from(lex.slice()))]
    Ident(Rc<str>),
}

/// Unescape a string literal content.
fn unescape_string(s: &str) -> Option<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                _ => return None,
            }
        } else {
            result.push(c);
        }
    }
    Some(result)
}

impl Token {
    /// Fixed spelling for keyword, operator and delimiter tokens.
    pub fn as_str(&self) -> Option<&'static str> {
        let s = match self {
            Token::True => "true",
            Token::False => "false",
            Token::Evaluate => "evaluate",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::EqEq => "==",
            Token::BangEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::And => "&&",
            Token::Or => "||",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Close => "}}",
            Token::Integer(_) | Token::Float(_) | Token::String(_) | Token::Ident(_) => {
                return None;
            }
        };
        Some(s)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "{}", n),
            Token::Float(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::Ident(id) => write!(f, "{}", id),
            other => f.write_str(other.as_str().unwrap_or("?")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source)
            .filter_map(|result| result.ok())
            .collect()
    }

    fn ident(s: &str) -> Token {
        Token::Ident(Rc::from(s))
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            lex("true false evaluate"),
            vec![Token::True, Token::False, Token::Evaluate]
        );
        assert_eq!(lex("trueish"), vec![ident("trueish")]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(lex("42"), vec![Token::Integer(42)]);
        assert_eq!(lex("1.5"), vec![Token::Float(1.5)]);
        assert_eq!(lex("2e3"), vec![Token::Float(2000.0)]);
    }

    #[test]
    fn test_strings() {
        assert_eq!(lex(r#""a\"b""#), vec![Token::String(Rc::from("a\"b"))]);
        assert_eq!(lex(r#""{{1}}""#), vec![Token::String(Rc::from("{{1}}"))]);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            lex("+ - * / % == != < <= > >= && ||"),
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Percent,
                Token::EqEq,
                Token::BangEq,
                Token::Lt,
                Token::LtEq,
                Token::Gt,
                Token::GtEq,
                Token::And,
                Token::Or,
            ]
        );
    }

    #[test]
    fn test_selector_chain() {
        assert_eq!(
            lex("p.Name.upper() }}"),
            vec![
                ident("p"),
                Token::Dot,
                ident("Name"),
                Token::Dot,
                ident("upper"),
                Token::LParen,
                Token::RParen,
                Token::Close,
            ]
        );
    }

    #[test]
    fn test_lexer_error_detection() {
        let results: Vec<_> = Token::lexer("a $ b").collect();
        assert!(results.iter().any(|r| r.is_err()));
    }

    #[test]
    fn test_display_round_trips_symbols() {
        for src in ["+", "<=", "&&", "}}", "evaluate"] {
            let tokens = lex(src);
            assert_eq!(tokens[0].to_string(), src);
        }
    }
}
