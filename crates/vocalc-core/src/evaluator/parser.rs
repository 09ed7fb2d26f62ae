//! Recursive-descent parser and interpreter.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary | <implicit *> power)*
//! unary   := ('+' | '-') unary | power
//! power   := primary ('^' unary)?
//! primary := NUMBER | CONSTANT | FUNCTION '(' expr ')' | '(' expr ')'
//! ```
//!
//! `^` is right-associative and binds tighter than unary minus, so
//! `-2^2 = -4` and `2^3^2 = 512`.

use std::f64::consts;

use super::lexer::{Constant, Function, Token};
use super::EvalError;
use crate::types::AngleUnit;

const MAX_DEPTH: usize = 128;

/// Upper bound on tokens; keeps the tree shallow enough to evaluate and drop
/// recursively.
const MAX_TOKENS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Constant(Constant),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Function,
        arg: Box<Expr>,
    },
}

/// Everything evaluation needs besides the tree itself.
pub struct EvalContext<'a> {
    pub angle_unit: AngleUnit,
    pub random: &'a dyn Fn() -> f64,
}

impl Expr {
    /// Evaluate with IEEE semantics; non-finite values are the caller's
    /// concern.
    pub fn eval(&self, ctx: &EvalContext<'_>) -> f64 {
        match self {
            Expr::Number(n) => *n,
            Expr::Constant(Constant::Pi) => consts::PI,
            Expr::Constant(Constant::E) => consts::E,
            Expr::Constant(Constant::Rand) => (ctx.random)(),
            Expr::Neg(inner) => -inner.eval(ctx),
            Expr::Binary { op, lhs, rhs } => {
                let (a, b) = (lhs.eval(ctx), rhs.eval(ctx));
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                }
            }
            Expr::Call { function, arg } => {
                let mut x = arg.eval(ctx);
                // Degrees apply only when the argument itself is finite;
                // otherwise the raw value goes through unchanged.
                if function.is_trig() && ctx.angle_unit == AngleUnit::Degrees && x.is_finite() {
                    x = x.to_radians();
                }
                match function {
                    Function::Sin => x.sin(),
                    Function::Cos => x.cos(),
                    Function::Tan => x.tan(),
                    Function::Sqrt => x.sqrt(),
                    Function::Log => x.log10(),
                    Function::Ln => x.ln(),
                    Function::Log2 => x.log2(),
                    Function::Exp => x.exp(),
                }
            }
        }
    }
}

/// Parse a token stream into an expression tree.
pub fn parse(tokens: &[Token]) -> Result<Expr, EvalError> {
    if tokens.len() > MAX_TOKENS {
        return Err(EvalError::Syntax("expression too long".to_string()));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(Token::RParen) => Err(EvalError::Syntax("unmatched ')'".to_string())),
        Some(token) => Err(EvalError::Syntax(format!("unexpected {:?}", token))),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_rparen(&mut self) -> Result<(), EvalError> {
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            Some(token) => Err(EvalError::Syntax(format!("expected ')', found {:?}", token))),
            None => Err(EvalError::Syntax("expected ')'".to_string())),
        }
    }

    /// Run `parse` one level deeper, failing once `MAX_DEPTH` is exceeded.
    fn descend(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Expr, EvalError>,
    ) -> Result<Expr, EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::Syntax("expression nested too deeply".to_string()));
        }
        self.depth += 1;
        let inner = parse(self);
        self.depth -= 1;
        inner
    }

    fn nested(&mut self) -> Result<Expr, EvalError> {
        self.descend(Self::expr)
    }

    fn expr(&mut self) -> Result<Expr, EvalError> {
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

    fn term(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    lhs = binary(BinaryOp::Mul, lhs, rhs);
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    lhs = binary(BinaryOp::Div, lhs, rhs);
                }
                // `2(3)`, `2PI`, `3sqrt(4)`
                Some(token) if token.starts_operand() => {
                    let rhs = self.power()?;
                    lhs = binary(BinaryOp::Mul, lhs, rhs);
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.descend(Self::unary)?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.descend(Self::unary)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, EvalError> {
        let base = self.primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.pos += 1;
            let exponent = self.descend(Self::unary)?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(*n)),
            Some(Token::Constant(c)) => Ok(Expr::Constant(*c)),
            Some(Token::Function(function)) => {
                match self.advance() {
                    Some(Token::LParen) => {}
                    _ => {
                        return Err(EvalError::Syntax(format!(
                            "expected '(' after {}",
                            function.name()
                        )))
                    }
                }
                let arg = self.nested()?;
                self.expect_rparen()?;
                Ok(Expr::Call {
                    function: *function,
                    arg: Box::new(arg),
                })
            }
            Some(Token::LParen) => {
                let inner = self.nested()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Some(token) => Err(EvalError::Syntax(format!("unexpected {:?}", token))),
            None => Err(EvalError::Syntax("unexpected end of expression".to_string())),
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
