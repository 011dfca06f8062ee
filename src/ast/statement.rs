use super::{AstNode, Expression, Identifier};
use crate::token::Token;
use derive_more::Display;
use std::fmt::{self, Formatter};

#[derive(Display, Debug, Clone, PartialEq)]
pub enum Statement {
    Let(LetStatement),
    Expr(ExpressionStatement),
    Block(BlockStatement),
}

impl AstNode for Statement {
    fn token(&self) -> &Token {
        match self {
            Self::Let(stmt) => stmt.token(),
            Self::Expr(stmt) => stmt.token(),
            Self::Block(stmt) => stmt.token(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetStatement {
    pub token: Token,
    pub name: Identifier,
    pub value: Expression,
}

impl fmt::Display for LetStatement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} = {};",
            self.token_literal(),
            self.name,
            self.value
        )
    }
}

impl AstNode for LetStatement {
    fn token(&self) -> &Token {
        &self.token
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub token: Token,
    pub expression: Expression,
}

impl fmt::Display for ExpressionStatement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

impl AstNode for ExpressionStatement {
    fn token(&self) -> &Token {
        &self.token
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub token: Token,
    pub statements: Vec<Statement>,
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for stmt in self.statements.iter() {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

impl AstNode for BlockStatement {
    fn token(&self) -> &Token {
        &self.token
    }
}
