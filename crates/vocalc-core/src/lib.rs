//! # vocalc-core
//!
//! Deterministic core of a voice-driven calculator.
//!
//! This crate answers two questions for every spoken utterance:
//! - Is this a command, or arithmetic?
//! - If arithmetic, what is its value?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same utterance always normalizes the same way
//! 2. **No dynamic evaluation**: Expressions are parsed by a restricted grammar
//! 3. **Commands first**: Control phrases win over arithmetic
//! 4. **Non-fatal**: Every failure becomes user-visible feedback
//!
//! ## Example
//!
//! ```rust
//! use vocalc_core::{normalize, Evaluator, AngleUnit, Normalized};
//!
//! let normalized = normalize("square root of nine").unwrap();
//! assert_eq!(normalized, Normalized::Expression("sqrt(9)".to_string()));
//!
//! let evaluator = Evaluator::new(AngleUnit::Degrees, 2);
//! let result = evaluator.evaluate("sqrt(9)").unwrap();
//! assert_eq!(result.formatted, "3");
//! ```

pub mod evaluator;
pub mod history;
pub mod normalizer;
pub mod recognition;
pub mod session;
pub mod settings;
pub mod types;

// Re-export main types at crate root
pub use evaluator::{
    evaluate, format_result, EvalError, Evaluation, Evaluator, FixedRandom, RandomSource,
    ThreadRandom,
};
pub use history::{History, HistoryEntry};
pub use normalizer::{normalize, NormalizeError, Normalizer};
pub use recognition::{RecognitionErrorCode, RecognitionState, RestartPolicy};
pub use session::{is_complete_expression, Outcome, Session};
pub use settings::{Settings, SettingsError};
pub use types::{AngleUnit, CommandTag, Normalized, Theme};

/// Normalize an utterance and, if it is an expression, evaluate it.
///
/// Commands are returned untouched since they need session state.
pub fn interpret(
    utterance: &str,
    evaluator: &Evaluator,
) -> Result<Interpretation, InterpretError> {
    match normalize(utterance)? {
        Normalized::Command(tag) => Ok(Interpretation::Command(tag)),
        Normalized::Expression(expression) => {
            let evaluation = evaluator.evaluate(&expression)?;
            Ok(Interpretation::Value(evaluation))
        }
    }
}

/// Result of [`interpret`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interpretation {
    Command(CommandTag),
    Value(Evaluation),
}

/// Errors from [`interpret`]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InterpretError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Evaluate(#[from] EvalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpret_expression() {
        let evaluator = Evaluator::default();
        let result = interpret("five plus three", &evaluator).unwrap();
        assert!(matches!(result, Interpretation::Value(ref e) if e.formatted == "8"));
    }

    #[test]
    fn test_interpret_command() {
        let evaluator = Evaluator::default();
        assert_eq!(
            interpret("history", &evaluator).unwrap(),
            Interpretation::Command(CommandTag::History)
        );
    }

    #[test]
    fn test_interpret_errors() {
        let evaluator = Evaluator::default();
        assert!(matches!(
            interpret("order a pizza", &evaluator),
            Err(InterpretError::Normalize(NormalizeError::Unrecognized { .. }))
        ));
        assert!(matches!(
            interpret("one divided by zero", &evaluator),
            Err(InterpretError::Evaluate(EvalError::NonFinite { .. }))
        ));
    }
}
