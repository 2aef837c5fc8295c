//! Token definitions for quest-script statements.
//!
//! Each code line is lexed independently; location structure (`# name` and
//! `-` markers) is handled by the game parser before any lexing happens.

use crate::error::ParseError;
use logos::Logos;
use std::fmt;

/// Token type for quest-script statements.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Single-quoted string literal, quotes stripped.
    Str(String),
    /// Bare word: a statement keyword or a `$`-prefixed variable name.
    Ident(String),
    /// Colon `:` introducing an action body.
    Colon,
    /// Ampersand `&` separating statements on one line.
    Amp,
    /// Equals sign `=` in a variable assignment.
    Eq,
    /// Star `*` prefixing system statements like `*clr`.
    Star,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Str(s) => write!(f, "'{s}'"),
            Token::Ident(w) => write!(f, "{w}"),
            Token::Colon => write!(f, ":"),
            Token::Amp => write!(f, "&"),
            Token::Eq => write!(f, "="),
            Token::Star => write!(f, "*"),
        }
    }
}

/// Internal logos token — borrows from the source line and is converted to
/// an owned [`Token`] after lexing.
#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"![^\n]*")]
enum RawToken {
    #[regex(r"'[^'\n]*'")]
    Str,

    #[regex(r"\$?[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[token(":")]
    Colon,

    #[token("&")]
    Amp,

    #[token("=")]
    Eq,

    #[token("*")]
    Star,
}

/// Lex one code line into tokens.
pub fn lex(line: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(line);
    while let Some(raw) = lexer.next() {
        let token = match raw {
            Ok(RawToken::Str) => {
                let slice = lexer.slice();
                Token::Str(slice[1..slice.len() - 1].to_string())
            }
            Ok(RawToken::Ident) => Token::Ident(lexer.slice().to_string()),
            Ok(RawToken::Colon) => Token::Colon,
            Ok(RawToken::Amp) => Token::Amp,
            Ok(RawToken::Eq) => Token::Eq,
            Ok(RawToken::Star) => Token::Star,
            Err(()) => {
                return Err(ParseError::Lex {
                    at: lexer.span().start,
                });
            }
        };
        tokens.push(token);
    }
    Ok(tokens)
}
