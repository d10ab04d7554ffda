//! Recursive-descent parser for the expression language.

use super::ast::{BinaryOp, Expr, Program, Root, UnaryOp};
use super::error::ParseError;
use super::lexer::{self, Token};
use super::value::Value;

impl Program {
    /// Parse source text into a program.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for lexical errors, grammar violations,
    /// or references to names outside the sandbox namespace.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let tokens = lexer::tokenize(source)?;
        Parser { tokens, pos: 0 }.program()
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn program(&mut self) -> Result<Program, ParseError> {
        if self.peek().is_none() {
            return Err(ParseError::Empty);
        }
        let mut exprs = vec![self.expr()?];
        while self.eat(&Token::Semi) {
            // A trailing semicolon is allowed.
            if self.peek().is_none() {
                break;
            }
            exprs.push(self.expr()?);
        }
        match self.peek() {
            None => Ok(Program { exprs }),
            Some(tok) => Err(ParseError::UnexpectedToken(tok.to_string())),
        }
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        self.or()
    }

    fn or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.and()?;
        while self.eat(&Token::Or) {
            let rhs = self.and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.not()?;
        while self.eat(&Token::And) {
            let rhs = self.not()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn not(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&Token::Not) {
            let operand = self.not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.sum()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinaryOp::Eq,
            Some(Token::Ne) => BinaryOp::Ne,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.sum()?;
        Ok(binary(op, lhs, rhs))
    }

    fn sum(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&Token::Minus) {
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.next() {
            Some(Token::Int(value)) => Ok(Expr::Literal(Value::Int(value))),
            Some(Token::Bool(value)) => Ok(Expr::Literal(Value::Bool(value))),
            Some(Token::Str(value)) => Ok(Expr::Literal(Value::Str(value))),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                let root =
                    Root::from_name(&name).ok_or(ParseError::UnknownName(name))?;
                self.member(root)
            }
            Some(tok) => Err(ParseError::UnexpectedToken(tok.to_string())),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    /// `.member` or `.method(args…)` after a namespace root.
    fn member(&mut self, root: Root) -> Result<Expr, ParseError> {
        self.expect(&Token::Dot)?;
        let name = match self.next() {
            Some(Token::Ident(name)) => name,
            Some(tok) => return Err(ParseError::UnexpectedToken(tok.to_string())),
            None => return Err(ParseError::UnexpectedEnd),
        };
        if !self.eat(&Token::LParen) {
            return Ok(Expr::Property { root, name });
        }
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.expr()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RParen)?;
                break;
            }
        }
        Ok(Expr::Call {
            root,
            method: name,
            args,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), ParseError> {
        match self.peek() {
            Some(tok) if tok == token => {
                self.pos += 1;
                Ok(())
            }
            Some(tok) => Err(ParseError::UnexpectedToken(tok.to_string())),
            None => Err(ParseError::UnexpectedEnd),
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
