//! Restricted arithmetic evaluation.
//!
//! Expressions are prepared (operator glyphs normalized, whitespace stripped,
//! missing `)` appended), tokenized, parsed by a small recursive-descent
//! parser, and interpreted. Nothing outside the calculator grammar is ever
//! executed: unknown identifiers fail in the lexer as unsafe input.

pub mod format;
pub mod lexer;
pub mod parser;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::Settings;
use crate::types::AngleUnit;

pub use format::{format_result, MAX_DECIMAL_PLACES};
pub use lexer::{Constant, Function, Token};
pub use parser::{BinaryOp, Expr};

/// Errors from evaluation. All are user-visible and non-fatal.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalError {
    #[error("No expression to calculate")]
    Empty,

    #[error("Unsafe expression: '{fragment}' is not allowed")]
    Unsafe { fragment: String },

    #[error("Invalid expression: {0}")]
    Syntax(String),

    #[error("Invalid calculation: result is {value}")]
    NonFinite { value: f64 },
}

impl EvalError {
    /// Short message for the display and for speech.
    pub fn user_message(&self) -> &'static str {
        match self {
            EvalError::Empty => "No expression to calculate",
            EvalError::Unsafe { .. } | EvalError::Syntax(_) => "Invalid expression",
            EvalError::NonFinite { .. } => "Invalid calculation",
        }
    }
}

/// A successful evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// The expression as actually parsed (glyphs normalized, balanced)
    pub expression: String,

    /// Raw numeric value, always finite
    pub value: f64,

    /// Value rounded and rendered for display
    pub formatted: String,
}

/// Source of values for the `rand` token.
pub trait RandomSource: Send + Sync {
    /// A uniform sample in `[0, 1)`.
    fn sample(&self) -> f64;
}

/// Thread-local RNG from the `rand` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn sample(&self) -> f64 {
        rand::random::<f64>()
    }
}

/// Always returns the same value. Useful for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn sample(&self) -> f64 {
        self.0
    }
}

/// Evaluates calculator expressions under the current angle and rounding
/// settings.
#[derive(Clone)]
pub struct Evaluator {
    angle_unit: AngleUnit,
    decimal_places: u8,
    random: Arc<dyn RandomSource>,
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("angle_unit", &self.angle_unit)
            .field("decimal_places", &self.decimal_places)
            .finish_non_exhaustive()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(AngleUnit::default(), 2)
    }
}

impl Evaluator {
    pub fn new(angle_unit: AngleUnit, decimal_places: u8) -> Self {
        Self {
            angle_unit,
            decimal_places: decimal_places.min(MAX_DECIMAL_PLACES),
            random: Arc::new(ThreadRandom),
        }
    }

    /// Build an evaluator from session settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.angle_unit(), settings.decimal_places())
    }

    /// Replace the source used for `rand`.
    pub fn with_random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn angle_unit(&self) -> AngleUnit {
        self.angle_unit
    }

    pub fn decimal_places(&self) -> u8 {
        self.decimal_places
    }

    /// Evaluate an expression string.
    ///
    /// # Errors
    ///
    /// * [`EvalError::Empty`] for blank input
    /// * [`EvalError::Unsafe`] for characters or names outside the grammar
    /// * [`EvalError::Syntax`] for malformed expressions
    /// * [`EvalError::NonFinite`] when the value is NaN or infinite
    pub fn evaluate(&self, input: &str) -> Result<Evaluation, EvalError> {
        let expression = prepare(input);
        if expression.is_empty() {
            return Err(EvalError::Empty);
        }

        let tokens = lexer::tokenize(&expression)?;
        let tree = parser::parse(&tokens)?;

        let random = || self.random.sample();
        let value = tree.eval(&parser::EvalContext {
            angle_unit: self.angle_unit,
            random: &random,
        });

        if !value.is_finite() {
            tracing::debug!(expression = %expression, value, "Non-finite result");
            return Err(EvalError::NonFinite { value });
        }

        let formatted = format_result(value, self.decimal_places);
        tracing::debug!(expression = %expression, result = %formatted, "Expression evaluated");

        Ok(Evaluation {
            expression,
            value,
            formatted,
        })
    }
}

/// Normalize operator glyphs, strip whitespace and close open parentheses.
pub fn prepare(input: &str) -> String {
    let canonical: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '×' | '·' => '*',
            '÷' => '/',
            '−' => '-',
            other => other,
        })
        .collect();
    balance_parentheses(&canonical)
}

/// Append `)` until every `(` is closed. Extra `)` are left for the parser
/// to reject.
pub fn balance_parentheses(expression: &str) -> String {
    let open = expression.matches('(').count();
    let close = expression.matches(')').count();

    let mut balanced = expression.to_string();
    if open > close {
        balanced.push_str(&")".repeat(open - close));
    }
    balanced
}

/// Evaluate with default settings (degrees, two decimal places).
pub fn evaluate(expression: &str) -> Result<Evaluation, EvalError> {
    Evaluator::default().evaluate(expression)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn degrees() -> Evaluator {
        Evaluator::new(AngleUnit::Degrees, 2)
    }

    fn radians() -> Evaluator {
        Evaluator::new(AngleUnit::Radians, 3)
    }

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(degrees().evaluate("5+3").unwrap().formatted, "8");
        assert_eq!(degrees().evaluate("10 / 4").unwrap().formatted, "2.5");
        assert_eq!(degrees().evaluate("2^10").unwrap().formatted, "1024");
    }

    #[test]
    fn test_square_root() {
        let result = degrees().evaluate("sqrt(9)").unwrap();
        assert_eq!(result.value, 3.0);
        assert_eq!(result.formatted, "3");
    }

    #[test]
    fn test_trig_in_degrees_and_radians() {
        assert_eq!(degrees().evaluate("sin(90)").unwrap().formatted, "1");
        let radians_result = radians().evaluate("sin(90)").unwrap();
        assert!((radians_result.value - 0.894).abs() < 1e-3);
        assert_eq!(radians_result.formatted, "0.894");
    }

    #[test]
    fn test_auto_balancing() {
        let result = degrees().evaluate("sqrt(4").unwrap();
        assert_eq!(result.value, 2.0);
        assert_eq!(result.expression, "sqrt(4)");
        assert_eq!(degrees().evaluate("(1+(2*3").unwrap().formatted, "7");
    }

    #[test]
    fn test_excess_closer_is_invalid() {
        assert!(matches!(
            degrees().evaluate("2+3)"),
            Err(EvalError::Syntax(_))
        ));
    }

    #[test]
    fn test_unsafe_expression_rejected() {
        let err = degrees().evaluate("alert(1)").unwrap_err();
        assert!(matches!(err, EvalError::Unsafe { .. }));
        assert_eq!(err.user_message(), "Invalid expression");

        assert!(matches!(
            degrees().evaluate("process.exit()"),
            Err(EvalError::Unsafe { .. })
        ));
    }

    #[test]
    fn test_oversized_input_is_an_error() {
        let sum = format!("{}1", "1+".repeat(20_000));
        assert_eq!(
            degrees().evaluate(&sum).unwrap_err(),
            EvalError::Syntax("expression too long".to_string())
        );

        for input in [
            format!("{}1", "-".repeat(20_000)),
            format!("{}1", "(".repeat(20_000)),
        ] {
            let err = degrees().evaluate(&input).unwrap_err();
            assert!(matches!(err, EvalError::Syntax(_)));
            assert_eq!(err.user_message(), "Invalid expression");
        }
    }

    #[test]
    fn test_letter_x_before_constants() {
        assert_eq!(radians().evaluate("3xPI").unwrap().formatted, "9.425");
        assert_eq!(radians().evaluate("2xE").unwrap().formatted, "5.437");
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(degrees().evaluate("").unwrap_err(), EvalError::Empty);
        assert_eq!(degrees().evaluate("  ").unwrap_err(), EvalError::Empty);
        assert_eq!(EvalError::Empty.user_message(), "No expression to calculate");
    }

    #[test]
    fn test_non_finite_result() {
        let err = degrees().evaluate("1/0").unwrap_err();
        assert!(matches!(err, EvalError::NonFinite { .. }));
        assert_eq!(err.user_message(), "Invalid calculation");
        assert!(matches!(
            degrees().evaluate("sqrt(-4)"),
            Err(EvalError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_glyph_normalization() {
        assert_eq!(degrees().evaluate("6×7").unwrap().formatted, "42");
        assert_eq!(degrees().evaluate("8÷2").unwrap().formatted, "4");
        assert_eq!(degrees().evaluate("9−4").unwrap().formatted, "5");
        assert_eq!(degrees().evaluate("3x4").unwrap().formatted, "12");
    }

    #[test]
    fn test_constants() {
        assert_eq!(degrees().evaluate("PI").unwrap().formatted, "3.14");
        assert_eq!(degrees().evaluate("E").unwrap().formatted, "2.72");
        assert_eq!(degrees().evaluate("π").unwrap().formatted, "3.14");
    }

    #[test]
    fn test_named_functions() {
        assert_eq!(degrees().evaluate("log(100)").unwrap().formatted, "2");
        assert_eq!(degrees().evaluate("ln(E)").unwrap().formatted, "1");
        assert_eq!(degrees().evaluate("log2(1024)").unwrap().formatted, "10");
        assert_eq!(degrees().evaluate("exp(0)").unwrap().formatted, "1");
    }

    #[test]
    fn test_injected_random_source() {
        let evaluator = degrees().with_random_source(Arc::new(FixedRandom(0.5)));
        assert_eq!(evaluator.evaluate("rand*6").unwrap().formatted, "3");
    }

    #[test]
    fn test_thread_random_in_range() {
        for _ in 0..100 {
            let value = degrees().evaluate("rand").unwrap().value;
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_decimal_places_clamped() {
        assert_eq!(Evaluator::new(AngleUnit::Degrees, 50).decimal_places(), MAX_DECIMAL_PLACES);
    }

    #[test]
    fn test_balance_parentheses() {
        assert_eq!(balance_parentheses("sqrt(4"), "sqrt(4)");
        assert_eq!(balance_parentheses("((1"), "((1))");
        assert_eq!(balance_parentheses("1)"), "1)");
    }
}
