//! Tokenizer for calculator expressions.
//!
//! The lexer is the safety gate: anything outside the calculator alphabet
//! (unknown identifiers, stray symbols) is rejected here as unsafe, before a
//! parser ever sees it.

use super::EvalError;

/// Named unary functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Sqrt,
    /// Base-10 logarithm
    Log,
    /// Natural logarithm
    Ln,
    Log2,
    Exp,
}

impl Function {
    pub fn name(&self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Sqrt => "sqrt",
            Function::Log => "log",
            Function::Ln => "ln",
            Function::Log2 => "log2",
            Function::Exp => "exp",
        }
    }

    pub fn is_trig(&self) -> bool {
        matches!(self, Function::Sin | Function::Cos | Function::Tan)
    }
}

/// Named values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
    /// Uniform sample in `[0, 1)`, drawn at evaluation time
    Rand,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Function(Function),
    Constant(Constant),
}

impl Token {
    /// Whether this token can begin an operand, for implicit multiplication.
    pub fn starts_operand(&self) -> bool {
        matches!(
            self,
            Token::Number(_) | Token::LParen | Token::Function(_) | Token::Constant(_)
        )
    }
}

/// Split a prepared expression into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| EvalError::Syntax(format!("malformed number '{}'", literal)))?;
                tokens.push(Token::Number(value));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Caret);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            'π' => {
                tokens.push(Token::Constant(Constant::Pi));
                i += 1;
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphabetic() {
                    i += 1;
                }
                let mut word: String = chars[start..i].iter().collect::<String>().to_lowercase();
                // `log2(` is the only identifier with a digit in it.
                if word.ends_with("log") && chars.get(i) == Some(&'2') && chars.get(i + 1) == Some(&'(') {
                    word.push('2');
                    i += 1;
                }
                identifiers(&word, &mut tokens)?;
            }
            other => {
                return Err(EvalError::Unsafe {
                    fragment: other.to_string(),
                })
            }
        }
    }

    Ok(tokens)
}

/// Push the tokens for a run of letters. A run that is not a known name
/// may still be one glued to a multiplication `x` on either side, as in
/// `3xPI` or `PIx2`.
fn identifiers(word: &str, tokens: &mut Vec<Token>) -> Result<(), EvalError> {
    let unsafe_word = || EvalError::Unsafe {
        fragment: word.to_string(),
    };
    let mut split = Vec::new();
    if !split_identifiers(word, &mut split) {
        return Err(unsafe_word());
    }
    tokens.extend(split);
    Ok(())
}

fn split_identifiers(word: &str, tokens: &mut Vec<Token>) -> bool {
    if let Ok(token) = identifier(word) {
        tokens.push(token);
        return true;
    }
    if let Some(rest) = word.strip_prefix('x').filter(|rest| !rest.is_empty()) {
        tokens.push(Token::Star);
        return split_identifiers(rest, tokens);
    }
    if let Some(head) = word.strip_suffix('x').filter(|head| !head.is_empty()) {
        if split_identifiers(head, tokens) {
            tokens.push(Token::Star);
            return true;
        }
    }
    false
}

fn identifier(word: &str) -> Result<Token, EvalError> {
    let token = match word {
        "sin" => Token::Function(Function::Sin),
        "cos" => Token::Function(Function::Cos),
        "tan" => Token::Function(Function::Tan),
        "sqrt" => Token::Function(Function::Sqrt),
        "log" => Token::Function(Function::Log),
        "ln" => Token::Function(Function::Ln),
        "log2" => Token::Function(Function::Log2),
        "exp" => Token::Function(Function::Exp),
        "pi" => Token::Constant(Constant::Pi),
        "e" => Token::Constant(Constant::E),
        "rand" => Token::Constant(Constant::Rand),
        // A letter x between operands is multiplication.
        "x" => Token::Star,
        _ => {
            return Err(EvalError::Unsafe {
                fragment: word.to_string(),
            })
        }
    };
    Ok(token)
}
