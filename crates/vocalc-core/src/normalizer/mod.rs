//! Voice-to-math text normalization.
//!
//! Turns a final speech transcript into either a [`CommandTag`] or a
//! candidate expression string:
//!
//! 1. lower-case and trim
//! 2. command detection, first match wins (see [`CommandTag::PRIORITY`])
//! 3. substitution passes in fixed order (see [`passes::PIPELINE`])
//! 4. alphabet validation
//! 5. trailing `=` removal
//!
//! Command detection always wins over arithmetic: "what is five plus three"
//! is a CALCULATE command, not an expression.

pub mod passes;
pub mod patterns;

use thiserror::Error;

use crate::types::{CommandTag, Normalized};

/// Why an utterance could not be mapped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Nothing was said")]
    Empty,

    #[error("Could not understand voice input: {residue:?}")]
    Unrecognized {
        /// What was left after all passes ran
        residue: String,
    },
}

/// The rule-based normalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Map an utterance to a command or an expression.
    pub fn normalize(&self, utterance: &str) -> Result<Normalized, NormalizeError> {
        let text = utterance.trim().to_lowercase();
        if text.is_empty() {
            return Err(NormalizeError::Empty);
        }

        if let Some(tag) = self.detect_command(&text) {
            tracing::debug!(utterance = %text, command = %tag, "Command detected");
            return Ok(Normalized::Command(tag));
        }

        let mut expression = text;
        for (name, pass) in passes::PIPELINE.iter() {
            let next = pass(&expression);
            if next != expression {
                tracing::trace!(pass = *name, before = %expression, after = %next, "Pass applied");
            }
            expression = next;
        }

        if expression.is_empty() || !patterns::EXPRESSION_ALPHABET.is_match(&expression) {
            tracing::warn!(residue = %expression, "Utterance did not normalize to an expression");
            return Err(NormalizeError::Unrecognized {
                residue: expression,
            });
        }

        if let Some(stripped) = expression.strip_suffix('=') {
            expression = stripped.to_string();
        }
        if expression.is_empty() {
            return Err(NormalizeError::Unrecognized {
                residue: "=".to_string(),
            });
        }

        tracing::debug!(expression = %expression, "Utterance normalized");
        Ok(Normalized::Expression(expression))
    }

    /// First command tag whose pattern matches, in priority order.
    pub fn detect_command(&self, text: &str) -> Option<CommandTag> {
        CommandTag::PRIORITY
            .into_iter()
            .find(|tag| patterns::command_pattern(*tag).is_match(text))
    }
}

/// Convenience wrapper around [`Normalizer::normalize`].
pub fn normalize(utterance: &str) -> Result<Normalized, NormalizeError> {
    Normalizer::new().normalize(utterance)
}
