use lazy_static::lazy_static;
use std::collections::HashMap;
use strum_macros::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    #[strum(to_string = "ILLEGAL")]
    Illegal,
    #[strum(to_string = "EOF")]
    Eof,

    // Identifiers and literals
    #[strum(to_string = "IDENT")]
    Ident,
    #[strum(to_string = "INT")]
    Int,
    #[strum(to_string = "STRING")]
    String,

    // Operators
    #[strum(to_string = "=")]
    Assign,
    #[strum(to_string = "+")]
    Plus,
    #[strum(to_string = "-")]
    Minus,
    #[strum(to_string = "!")]
    Bang,
    #[strum(to_string = "*")]
    Asterisk,
    #[strum(to_string = "/")]
    Slash,
    #[strum(to_string = "<")]
    LT,
    #[strum(to_string = ">")]
    GT,
    #[strum(to_string = "==")]
    Eq,
    #[strum(to_string = "!=")]
    NotEq,

    // Delimiters
    #[strum(to_string = ",")]
    Comma,
    #[strum(to_string = ";")]
    Semicolon,
    #[strum(to_string = "(")]
    LParen,
    #[strum(to_string = ")")]
    RParen,
    #[strum(to_string = "{")]
    LBrace,
    #[strum(to_string = "}")]
    RBrace,

    // Keywords
    #[strum(to_string = "LET")]
    Let,
    #[strum(to_string = "TRUE")]
    True,
    #[strum(to_string = "FALSE")]
    False,
    #[strum(to_string = "IF")]
    If,
    #[strum(to_string = "ELSE")]
    Else,
    #[strum(to_string = "NULL")]
    Null,
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, TokenType> = vec![
        ("let", TokenType::Let),
        ("true", TokenType::True),
        ("false", TokenType::False),
        ("if", TokenType::If),
        ("else", TokenType::Else),
        ("null", TokenType::Null),
    ]
    .into_iter()
    .collect();
}

pub fn lookup_ident(ident: &str) -> TokenType {
    KEYWORDS.get(ident).copied().unwrap_or(TokenType::Ident)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub literal: String,
}

impl Token {
    pub fn new(token_type: TokenType, literal: impl Into<String>) -> Self {
        Self {
            token_type,
            literal: literal.into(),
        }
    }

    pub fn new_from_char(token_type: TokenType, ch: u8) -> Self {
        Self::new(token_type, (ch as char).to_string())
    }

    /// Classifies a scanned word as a keyword or an identifier.
    pub fn from_word(word: &str) -> Self {
        Self::new(lookup_ident(word), word)
    }

    pub fn is(&self, token_type: TokenType) -> bool {
        self.token_type == token_type
    }
}
