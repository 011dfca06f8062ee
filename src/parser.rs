use crate::ast::{self, Expression, Operator, Statement};
use crate::lexer::Lexer;
use crate::token::{Token, TokenType};
use custom_error::custom_error;
use lazy_static::lazy_static;
use std::collections::HashMap;
use tracing::debug;

custom_error! {
    #[derive(Clone, PartialEq)]
    pub ParseError

    UnexpectedToken{expected: TokenType, got: TokenType} = "expected next token to be {expected}, got {got} instead",
    NoPrefixParseFn{token: TokenType} = "no prefix parse function for {token} found",
    InvalidInteger{literal: String} = "could not parse {literal} as integer",
    InvalidCallee{callee: String} = "cannot call {callee}: only builtin names are callable",
    NestingTooDeep{limit: usize} = "expression nested deeper than {limit} levels",
}

/// Deepest chain of nested expressions the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

lazy_static! {
    static ref PRECEDENCES: HashMap<TokenType, Precedence> = vec![
        (TokenType::Eq, Precedence::Equals),
        (TokenType::NotEq, Precedence::Equals),
        (TokenType::LT, Precedence::LessGreater),
        (TokenType::GT, Precedence::LessGreater),
        (TokenType::Plus, Precedence::Sum),
        (TokenType::Minus, Precedence::Sum),
        (TokenType::Slash, Precedence::Product),
        (TokenType::Asterisk, Precedence::Product),
        (TokenType::LParen, Precedence::Call),
    ]
    .into_iter()
    .collect();
}

type PrefixParseFn = fn(&mut Parser) -> Option<Expression>;
type InfixParseFn = fn(&mut Parser, Expression) -> Option<Expression>;

fn prefix_parse_fn(token_type: TokenType) -> Option<PrefixParseFn> {
    let parse_fn: PrefixParseFn = match token_type {
        TokenType::Ident => Parser::parse_identifier,
        TokenType::Int => Parser::parse_integer_literal,
        TokenType::String => Parser::parse_string_literal,
        TokenType::True | TokenType::False => Parser::parse_boolean,
        TokenType::Null => Parser::parse_null,
        TokenType::Bang | TokenType::Minus => Parser::parse_prefix_expression,
        TokenType::LParen => Parser::parse_grouped_expression,
        TokenType::If => Parser::parse_if_expression,
        _ => return None,
    };
    Some(parse_fn)
}

fn infix_parse_fn(token_type: TokenType) -> Option<InfixParseFn> {
    let parse_fn: InfixParseFn = match token_type {
        TokenType::Plus
        | TokenType::Minus
        | TokenType::Slash
        | TokenType::Asterisk
        | TokenType::Eq
        | TokenType::NotEq
        | TokenType::LT
        | TokenType::GT => Parser::parse_infix_expression,
        TokenType::LParen => Parser::parse_call_expression,
        _ => return None,
    };
    Some(parse_fn)
}

fn precedence_of(token: &Token) -> Precedence {
    PRECEDENCES
        .get(&token.token_type)
        .copied()
        .unwrap_or(Precedence::Lowest)
}

pub struct Parser {
    lexer: Lexer,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<ParseError>,
    depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let cur_token = lexer.next_token();
        let peek_token = lexer.next_token();

        Self {
            lexer,
            cur_token,
            peek_token,
            errors: vec![],
            depth: 0,
        }
    }

    fn next_token(&mut self) {
        self.cur_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    /// Parses the whole token stream. Every syntax error encountered along
    /// the way is returned together rather than stopping at the first one.
    pub fn parse_program(mut self) -> Result<ast::Program, Vec<ParseError>> {
        let mut program = ast::Program::default();

        while !self.cur_token.is(TokenType::Eof) {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt)
            }
            self.next_token();
        }

        debug!(
            statements = program.statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );

        if self.errors.is_empty() {
            Ok(program)
        } else {
            Err(self.errors)
        }
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.cur_token.token_type {
            TokenType::Let => self.parse_let_statement().map(Statement::Let),
            _ => self.parse_expression_statement().map(Statement::Expr),
        }
    }

    fn parse_let_statement(&mut self) -> Option<ast::LetStatement> {
        let token = self.cur_token.clone();

        if !self.expect_peek(TokenType::Ident) {
            return None;
        }

        let name: ast::Identifier = self.cur_token.clone().into();

        if !self.expect_peek(TokenType::Assign) {
            return None;
        }

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token.is(TokenType::Semicolon) {
            self.next_token();
        }

        Some(ast::LetStatement { token, name, value })
    }

    fn parse_expression_statement(&mut self) -> Option<ast::ExpressionStatement> {
        let token = self.cur_token.clone();
        let expression = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token.is(TokenType::Semicolon) {
            self.next_token();
        }

        Some(ast::ExpressionStatement { token, expression })
    }

    fn parse_block_statement(&mut self) -> Option<ast::BlockStatement> {
        let token = self.cur_token.clone();
        let mut statements = vec![];

        self.next_token();

        while !self.cur_token.is(TokenType::RBrace) {
            if self.cur_token.is(TokenType::Eof) {
                self.errors.push(ParseError::UnexpectedToken {
                    expected: TokenType::RBrace,
                    got: TokenType::Eof,
                });
                return None;
            }
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }

        Some(ast::BlockStatement { token, statements })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        if self.depth >= MAX_NESTING_DEPTH {
            let err = ParseError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
            };
            if self.errors.last() != Some(&err) {
                self.errors.push(err);
            }
            return None;
        }

        self.depth += 1;
        let expression = self.parse_pratt_expression(precedence);
        self.depth -= 1;
        expression
    }

    fn parse_pratt_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let prefix = match prefix_parse_fn(self.cur_token.token_type) {
            Some(prefix) => prefix,
            None => {
                self.errors.push(ParseError::NoPrefixParseFn {
                    token: self.cur_token.token_type,
                });
                return None;
            }
        };

        let mut left = prefix(self)?;

        while !self.peek_token.is(TokenType::Semicolon) && precedence < self.peek_precedence() {
            let infix = match infix_parse_fn(self.peek_token.token_type) {
                Some(infix) => infix,
                None => return Some(left),
            };

            self.next_token();
            left = infix(self, left)?;
        }

        Some(left)
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        Some(Expression::Identifier(self.cur_token.clone().into()))
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        match token.literal.parse() {
            Ok(value) => Some(Expression::IntegerLiteral(ast::IntegerLiteral { token, value })),
            Err(_) => {
                self.errors.push(ParseError::InvalidInteger {
                    literal: token.literal,
                });
                None
            }
        }
    }

    fn parse_string_literal(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        let value = token.literal.clone();
        Some(Expression::String(ast::StringLiteral { token, value }))
    }

    fn parse_boolean(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        let value = token.is(TokenType::True);
        Some(Expression::Boolean(ast::Boolean { token, value }))
    }

    fn parse_null(&mut self) -> Option<Expression> {
        Some(Expression::Null(ast::NullLiteral {
            token: self.cur_token.clone(),
        }))
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        let operator = Operator::from_token_type(token.token_type)?;

        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;

        Some(Expression::Prefix(ast::PrefixExpression {
            token,
            operator,
            right: Box::new(right),
        }))
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let token = self.cur_token.clone();
        let operator = Operator::from_token_type(token.token_type)?;
        let precedence = precedence_of(&token);

        self.next_token();
        let right = self.parse_expression(precedence)?;

        Some(Expression::Infix(ast::InfixExpression {
            token,
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }))
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();

        let expression = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenType::RParen) {
            return None;
        }

        Some(expression)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();

        if !self.expect_peek(TokenType::LParen) {
            return None;
        }

        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenType::RParen) || !self.expect_peek(TokenType::LBrace) {
            return None;
        }

        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_token.is(TokenType::Else) {
            self.next_token();

            if !self.expect_peek(TokenType::LBrace) {
                return None;
            }

            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Some(Expression::If(ast::IfExpression {
            token,
            condition: Box::new(condition),
            consequence,
            alternative,
        }))
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let token = self.cur_token.clone();
        let arguments = self.parse_call_arguments()?;

        match function {
            Expression::Identifier(function) => Some(Expression::Call(ast::CallExpression {
                token,
                function,
                arguments,
            })),
            callee => {
                self.errors.push(ParseError::InvalidCallee {
                    callee: callee.to_string(),
                });
                None
            }
        }
    }

    fn parse_call_arguments(&mut self) -> Option<Vec<Expression>> {
        let mut arguments = vec![];

        if self.peek_token.is(TokenType::RParen) {
            self.next_token();
            return Some(arguments);
        }

        self.next_token();
        arguments.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token.is(TokenType::Comma) {
            self.next_token();
            self.next_token();
            arguments.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(TokenType::RParen) {
            return None;
        }

        Some(arguments)
    }

    fn peek_precedence(&self) -> Precedence {
        precedence_of(&self.peek_token)
    }

    fn expect_peek(&mut self, expected: TokenType) -> bool {
        if self.peek_token.is(expected) {
            self.next_token();
            true
        } else {
            self.peek_error(expected);
            false
        }
    }

    fn peek_error(&mut self, expected: TokenType) {
        self.errors.push(ParseError::UnexpectedToken {
            expected,
            got: self.peek_token.token_type,
        });
    }
}
