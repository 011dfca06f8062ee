use crate::token::{Token, TokenType};

pub struct Lexer {
    input: String,
    position: usize,
    read_position: usize,
    ch: u8,
}

fn is_letter(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_identifier_char(c: u8) -> bool {
    is_letter(c) || c.is_ascii_digit()
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_token())
    }
}

impl Lexer {
    pub fn new(input: impl Into<String>) -> Self {
        let mut lexer = Self {
            input: input.into(),
            position: 0,
            read_position: 0,
            ch: 0,
        };
        lexer.read_char();
        lexer
    }

    fn read_char(&mut self) {
        self.ch = *self.input.as_bytes().get(self.read_position).unwrap_or(&0);
        self.position = self.read_position;
        self.read_position += 1;
    }

    fn peek_char(&self) -> u8 {
        *self.input.as_bytes().get(self.read_position).unwrap_or(&0)
    }

    /// Returns the next token, or `Eof` once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let token = match self.ch {
            b'=' => self.two_char_or(TokenType::Eq, TokenType::Assign),
            b'!' => self.two_char_or(TokenType::NotEq, TokenType::Bang),
            b'+' => Token::new_from_char(TokenType::Plus, self.ch),
            b'-' => Token::new_from_char(TokenType::Minus, self.ch),
            b'*' => Token::new_from_char(TokenType::Asterisk, self.ch),
            b'/' => Token::new_from_char(TokenType::Slash, self.ch),
            b'<' => Token::new_from_char(TokenType::LT, self.ch),
            b'>' => Token::new_from_char(TokenType::GT, self.ch),
            b';' => Token::new_from_char(TokenType::Semicolon, self.ch),
            b',' => Token::new_from_char(TokenType::Comma, self.ch),
            b'(' => Token::new_from_char(TokenType::LParen, self.ch),
            b')' => Token::new_from_char(TokenType::RParen, self.ch),
            b'{' => Token::new_from_char(TokenType::LBrace, self.ch),
            b'}' => Token::new_from_char(TokenType::RBrace, self.ch),
            b'"' => Token::new(TokenType::String, self.read_string()),
            0 if self.position >= self.input.len() => return Token::new(TokenType::Eof, ""),
            c => {
                if is_letter(c) {
                    return Token::from_word(self.read_identifier());
                } else if c.is_ascii_digit() {
                    return Token::new(TokenType::Int, self.read_number());
                } else {
                    Token::new_from_char(TokenType::Illegal, c)
                }
            }
        };
        self.read_char();
        token
    }

    // `==` and `!=` share their first byte with a single-character operator.
    fn two_char_or(&mut self, double: TokenType, single: TokenType) -> Token {
        if self.peek_char() == b'=' {
            let start = self.position;
            self.read_char();
            Token::new(double, &self.input[start..=self.position])
        } else {
            Token::new_from_char(single, self.ch)
        }
    }

    fn read_identifier(&mut self) -> &str {
        let start = self.position;
        while is_identifier_char(self.ch) {
            self.read_char()
        }
        &self.input[start..self.position]
    }

    fn read_number(&mut self) -> &str {
        let start = self.position;
        while self.ch.is_ascii_digit() {
            self.read_char()
        }
        &self.input[start..self.position]
    }

    // Leaves the cursor on the closing quote, or on end of input if unterminated.
    fn read_string(&mut self) -> String {
        let start = self.position + 1;
        loop {
            self.read_char();
            if self.ch == b'"' || self.ch == 0 {
                break;
            }
        }
        self.input[start..self.position].to_owned()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.ch, b' ' | b'\t' | b'\n' | b'\r') {
            self.read_char();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_next_token() {
        let input = "let five = 5;
let ten = 10;

let result = add(five, ten);
!-/*5;
5 < 10 > 5;

if (5 < 10) {
    puts(true);
} else {
    puts(false);
}

10 == 10;
10 != 9;
\"foobar\"
\"foo bar\"
\"\"
let snake_case2 = null;
";

        let cases = [
            (TokenType::Let, "let"),
            (TokenType::Ident, "five"),
            (TokenType::Assign, "="),
            (TokenType::Int, "5"),
            (TokenType::Semicolon, ";"),
            (TokenType::Let, "let"),
            (TokenType::Ident, "ten"),
            (TokenType::Assign, "="),
            (TokenType::Int, "10"),
            (TokenType::Semicolon, ";"),
            (TokenType::Let, "let"),
            (TokenType::Ident, "result"),
            (TokenType::Assign, "="),
            (TokenType::Ident, "add"),
            (TokenType::LParen, "("),
            (TokenType::Ident, "five"),
            (TokenType::Comma, ","),
            (TokenType::Ident, "ten"),
            (TokenType::RParen, ")"),
            (TokenType::Semicolon, ";"),
            (TokenType::Bang, "!"),
            (TokenType::Minus, "-"),
            (TokenType::Slash, "/"),
            (TokenType::Asterisk, "*"),
            (TokenType::Int, "5"),
            (TokenType::Semicolon, ";"),
            (TokenType::Int, "5"),
            (TokenType::LT, "<"),
            (TokenType::Int, "10"),
            (TokenType::GT, ">"),
            (TokenType::Int, "5"),
            (TokenType::Semicolon, ";"),
            (TokenType::If, "if"),
            (TokenType::LParen, "("),
            (TokenType::Int, "5"),
            (TokenType::LT, "<"),
            (TokenType::Int, "10"),
            (TokenType::RParen, ")"),
            (TokenType::LBrace, "{"),
            (TokenType::Ident, "puts"),
            (TokenType::LParen, "("),
            (TokenType::True, "true"),
            (TokenType::RParen, ")"),
            (TokenType::Semicolon, ";"),
            (TokenType::RBrace, "}"),
            (TokenType::Else, "else"),
            (TokenType::LBrace, "{"),
            (TokenType::Ident, "puts"),
            (TokenType::LParen, "("),
            (TokenType::False, "false"),
            (TokenType::RParen, ")"),
            (TokenType::Semicolon, ";"),
            (TokenType::RBrace, "}"),
            (TokenType::Int, "10"),
            (TokenType::Eq, "=="),
            (TokenType::Int, "10"),
            (TokenType::Semicolon, ";"),
            (TokenType::Int, "10"),
            (TokenType::NotEq, "!="),
            (TokenType::Int, "9"),
            (TokenType::Semicolon, ";"),
            (TokenType::String, "foobar"),
            (TokenType::String, "foo bar"),
            (TokenType::String, ""),
            (TokenType::Let, "let"),
            (TokenType::Ident, "snake_case2"),
            (TokenType::Assign, "="),
            (TokenType::Null, "null"),
            (TokenType::Semicolon, ";"),
            (TokenType::Eof, ""),
        ];

        let mut lexer = Lexer::new(input);

        for (token_type, literal) in cases.iter() {
            assert_eq!(lexer.next_token(), Token::new(*token_type, *literal));
        }
    }

    #[test]
    fn test_eof_repeats() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token(), Token::new(TokenType::Ident, "x"));
        for _ in 0..3 {
            assert_eq!(lexer.next_token(), Token::new(TokenType::Eof, ""));
        }
    }

    #[test]
    fn test_illegal_and_unterminated() {
        let tokens: Vec<Token> = Lexer::new("@ 1 \"abc").take(4).collect();
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Illegal, "@"),
                Token::new(TokenType::Int, "1"),
                Token::new(TokenType::String, "abc"),
                Token::new(TokenType::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_nul_byte_is_illegal() {
        let tokens: Vec<Token> = Lexer::new("1\u{0}2").take(4).collect();
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Int, "1"),
                Token::new(TokenType::Illegal, "\u{0}"),
                Token::new(TokenType::Int, "2"),
                Token::new(TokenType::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_no_escape_processing() {
        let mut lexer = Lexer::new(r#""a\n""#);
        assert_eq!(lexer.next_token(), Token::new(TokenType::String, r"a\n"));
    }
}
