//! Reverse-Polish construction and serialization.

use std::fmt;

use cellgeom_geom::SurfaceRef;

use crate::error::{CsgError, Result};
use crate::expr::{BoolExpr, ExprKind, Op};

/// A reverse-Polish token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Push the positive half-space of a surface.
    Surface(SurfaceRef),
    /// Pop two, push their intersection (`I`).
    Intersection,
    /// Pop two, push their union (`U`).
    Union,
    /// Pop one, push its complement (`C`).
    Complement,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Surface(s) => write!(f, "{}", s.name()),
            Token::Intersection => f.write_str("I"),
            Token::Union => f.write_str("U"),
            Token::Complement => f.write_str("C"),
        }
    }
}

impl BoolExpr {
    /// Build an expression from reverse-Polish tokens.
    ///
    /// Fails with [`CsgError::MalformedExpression`] when an operator lacks
    /// operands or the stack does not reduce to exactly one expression.
    pub fn from_polish(tokens: &[Token]) -> Result<Self> {
        let mut stack: Vec<BoolExpr> = Vec::new();
        for (pos, token) in tokens.iter().enumerate() {
            match token {
                Token::Surface(s) => stack.push(BoolExpr::halfspace(s.clone(), true)),
                Token::Complement => {
                    let a = stack.pop().ok_or_else(|| missing_operand(pos, token))?;
                    stack.push(a.complement());
                }
                Token::Intersection | Token::Union => {
                    let b = stack.pop().ok_or_else(|| missing_operand(pos, token))?;
                    let a = stack.pop().ok_or_else(|| missing_operand(pos, token))?;
                    let op = if *token == Token::Intersection {
                        Op::And
                    } else {
                        Op::Or
                    };
                    stack.push(BoolExpr::combine(op, [a, b]));
                }
            }
        }
        match stack.len() {
            1 => stack
                .pop()
                .ok_or_else(|| CsgError::MalformedExpression("empty token stream".into())),
            0 => Err(CsgError::MalformedExpression("empty token stream".into())),
            n => Err(CsgError::MalformedExpression(format!(
                "{n} operands left without an operator"
            ))),
        }
    }

    /// Serialize to reverse-Polish tokens.
    ///
    /// `Empty` and `Full` have no token form and yield an empty list.
    pub fn to_polish(&self) -> Vec<Token> {
        let mut out = Vec::new();
        self.write_polish(&mut out);
        out
    }

    fn write_polish(&self, out: &mut Vec<Token>) {
        match self.kind() {
            ExprKind::Empty | ExprKind::Full => {}
            ExprKind::Leaf(h) => {
                out.push(Token::Surface(h.surface().clone()));
                if !h.is_positive() {
                    out.push(Token::Complement);
                }
            }
            ExprKind::And(c) | ExprKind::Or(c) => {
                let op = if matches!(self.kind(), ExprKind::And(_)) {
                    Token::Intersection
                } else {
                    Token::Union
                };
                for (i, e) in c.iter().enumerate() {
                    e.write_polish(out);
                    if i > 0 {
                        out.push(op.clone());
                    }
                }
            }
        }
    }
}

fn missing_operand(pos: usize, token: &Token) -> CsgError {
    CsgError::MalformedExpression(format!("operator {token} at position {pos} lacks operands"))
}
