//! Session controller.
//!
//! A [`Session`] owns everything a single calculator user touches: the
//! settings, the history, and the current expression and result. Each
//! operation returns an [`Outcome`] describing what changed, with a feedback
//! line for the display and, where appropriate, text to speak.

use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::evaluator::{EvalError, Evaluator, RandomSource, ThreadRandom};
use crate::history::History;
use crate::normalizer::{NormalizeError, Normalizer};
use crate::settings::Settings;
use crate::types::{AngleUnit, CommandTag, Normalized};

lazy_static! {
    static ref TRAILING_NUMBER: Regex = Regex::new(r"(\d+\.?\d*)$").unwrap();
    static ref TRAILING_ENTRY: Regex = Regex::new(r"(\d+\.?\d*|[+\-*/()]+)$").unwrap();
    static ref UNCLOSED_FUNCTION: Regex =
        Regex::new(r"(sin|cos|tan|log|ln|log2|exp|sqrt)\([^)]*$").unwrap();
    static ref HAS_DIGIT: Regex = Regex::new(r"[0-9]").unwrap();
}

/// What a session operation did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Display was reset.
    Cleared,

    /// An utterance became the current expression.
    Expression { expression: String, complete: bool },

    /// Evaluation succeeded and was recorded.
    Calculated {
        expression: String,
        result: String,
        speak: Option<String>,
    },

    /// Evaluation failed; the current expression is unchanged.
    Failed { error: EvalError },

    /// The newest history entry was reloaded.
    Repeated {
        expression: String,
        result: String,
        speak: Option<String>,
    },

    /// Repeat was requested with an empty history.
    NothingToRepeat,

    /// The host should show the history view.
    ShowHistory,

    /// The utterance mapped to neither a command nor an expression.
    NotUnderstood { residue: String },

    /// A history entry was loaded back into the display.
    Loaded { expression: String, result: String },

    /// No history entry at the requested position.
    HistoryItemMissing { index: usize },

    HistoryCleared,

    AngleUnitChanged { unit: AngleUnit },

    /// A word problem was answered by a solver and recorded.
    Solved { question: String, answer: String },
}

impl Outcome {
    /// Text to hand to the speech synthesizer, if any.
    pub fn speak(&self) -> Option<&str> {
        match self {
            Outcome::Calculated { speak, .. } | Outcome::Repeated { speak, .. } => {
                speak.as_deref()
            }
            _ => None,
        }
    }

    /// Whether this outcome reports a problem to the user.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Outcome::Failed { .. }
                | Outcome::NotUnderstood { .. }
                | Outcome::HistoryItemMissing { .. }
        )
    }

    /// One-line feedback for the display.
    pub fn feedback(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Cleared => write!(f, "Display cleared"),
            Outcome::Expression { expression, .. } => write!(f, "Understood: {}", expression),
            Outcome::Calculated { result, .. } => write!(f, "Result: {}", result),
            Outcome::Failed { error } => write!(f, "Error: {}", error.user_message()),
            Outcome::Repeated {
                expression, result, ..
            } => write!(f, "Repeated: {} = {}", expression, result),
            Outcome::NothingToRepeat => write!(f, "No previous calculations to repeat"),
            Outcome::ShowHistory => write!(f, "Opening history"),
            Outcome::NotUnderstood { .. } => write!(f, "Could not understand voice input"),
            Outcome::Loaded { .. } => write!(f, "Calculation loaded from history"),
            Outcome::HistoryItemMissing { .. } => write!(f, "History item not found"),
            Outcome::HistoryCleared => write!(f, "History cleared"),
            Outcome::AngleUnitChanged { unit } => write!(f, "Angle unit set to {}", unit),
            Outcome::Solved { .. } => write!(f, "Solution attempt completed"),
        }
    }
}

/// Session-scoped calculator state.
pub struct Session {
    settings: Settings,
    history: History,
    normalizer: Normalizer,
    random: Arc<dyn RandomSource>,
    current_expression: String,
    current_result: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("settings", &self.settings)
            .field("history_len", &self.history.len())
            .field("current_expression", &self.current_expression)
            .field("current_result", &self.current_result)
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            history: History::new(),
            normalizer: Normalizer::new(),
            random: Arc::new(ThreadRandom),
            current_expression: String::new(),
            current_result: "0".to_string(),
        }
    }

    /// Replace the source used for `rand` in every later calculation.
    pub fn with_random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn current_expression(&self) -> &str {
        &self.current_expression
    }

    pub fn current_result(&self) -> &str {
        &self.current_result
    }

    /// Handle a final transcript from the recognizer.
    ///
    /// Commands are dispatched immediately. An expression replaces the
    /// current one and the outcome reports whether it looks complete enough
    /// to auto-calculate. Nothing changes when the utterance is not
    /// understood.
    pub fn handle_transcript(&mut self, transcript: &str) -> Outcome {
        tracing::info!(transcript = %transcript, "Processing voice input");

        match self.normalizer.normalize(transcript) {
            Ok(Normalized::Command(tag)) => self.dispatch(tag),
            Ok(Normalized::Expression(expression)) => {
                let complete = is_complete_expression(&expression);
                self.current_expression = expression.clone();
                Outcome::Expression {
                    expression,
                    complete,
                }
            }
            Err(err) => {
                let residue = match err {
                    NormalizeError::Empty => String::new(),
                    NormalizeError::Unrecognized { residue } => residue,
                };
                Outcome::NotUnderstood { residue }
            }
        }
    }

    fn dispatch(&mut self, tag: CommandTag) -> Outcome {
        match tag {
            CommandTag::Clear => self.clear(),
            CommandTag::Calculate => self.calculate(),
            CommandTag::Repeat => self.repeat_last(),
            CommandTag::History => Outcome::ShowHistory,
        }
    }

    /// Evaluate the current expression under the current settings.
    pub fn calculate(&mut self) -> Outcome {
        let evaluator =
            Evaluator::from_settings(&self.settings).with_random_source(Arc::clone(&self.random));

        match evaluator.evaluate(&self.current_expression) {
            Ok(evaluation) => {
                let result = evaluation.formatted;
                self.history.record(evaluation.expression.clone(), result.clone());
                self.current_expression = result.clone();
                self.current_result = result.clone();

                tracing::info!(
                    expression = %evaluation.expression,
                    result = %result,
                    history_len = self.history.len(),
                    "Calculation recorded"
                );

                let speak = self.settings.auto_speak().then(|| result.clone());
                Outcome::Calculated {
                    expression: evaluation.expression,
                    result,
                    speak,
                }
            }
            Err(error) => {
                tracing::warn!(expression = %self.current_expression, error = %error, "Calculation failed");
                Outcome::Failed { error }
            }
        }
    }

    /// Reload the newest history entry into the display.
    pub fn repeat_last(&mut self) -> Outcome {
        let Some(entry) = self.history.latest() else {
            return Outcome::NothingToRepeat;
        };
        let (expression, result) = (entry.expression.clone(), entry.result.clone());

        self.current_expression = expression.clone();
        self.current_result = result.clone();

        let speak = self
            .settings
            .voice_feedback()
            .then(|| format!("Last result: {}", result));
        Outcome::Repeated {
            expression,
            result,
            speak,
        }
    }

    /// Empty the expression and reset the result to `0`.
    pub fn clear(&mut self) -> Outcome {
        self.current_expression.clear();
        self.current_result = "0".to_string();
        Outcome::Cleared
    }

    /// Append keypad input. A lone `0` is replaced by a digit, and a second
    /// decimal point in the same number is ignored.
    pub fn append(&mut self, value: &str) {
        let is_number = value != "." && value.parse::<f64>().is_ok();
        if self.current_expression == "0" && is_number {
            self.current_expression = value.to_string();
            return;
        }

        if value == "." {
            if let Some(number) = TRAILING_NUMBER.find(&self.current_expression) {
                if number.as_str().contains('.') {
                    return;
                }
            }
        }

        self.current_expression.push_str(value);
    }

    /// Remove the last character.
    pub fn backspace(&mut self) {
        self.current_expression.pop();
        self.reset_result_if_empty();
    }

    /// Remove the trailing number or run of operators.
    pub fn clear_entry(&mut self) {
        match TRAILING_ENTRY.find(&self.current_expression) {
            Some(entry) => {
                let start = entry.start();
                self.current_expression.truncate(start);
            }
            None => self.current_expression.clear(),
        }
        self.reset_result_if_empty();
    }

    /// Negate the trailing number, or failing that the whole expression.
    pub fn toggle_sign(&mut self) {
        if let Some(number) = TRAILING_NUMBER.find(&self.current_expression) {
            let negated = negate(number.as_str());
            let start = number.start();
            self.current_expression.truncate(start);
            self.current_expression.push_str(&negated);
            return;
        }

        if self.current_expression == self.current_result
            && self.current_result.parse::<f64>().is_ok()
        {
            self.current_expression = negate(&self.current_result);
        } else if let Some(rest) = self.current_expression.strip_prefix('-') {
            self.current_expression = rest.to_string();
        } else {
            self.current_expression.insert(0, '-');
        }
    }

    /// Load a history entry by position (0 is the newest).
    pub fn reuse_history(&mut self, index: usize) -> Outcome {
        match self.history.get(index) {
            Some(entry) => {
                let (expression, result) = (entry.expression.clone(), entry.result.clone());
                self.current_expression = expression.clone();
                self.current_result = result.clone();
                Outcome::Loaded { expression, result }
            }
            None => {
                tracing::warn!(index, "History item not found");
                Outcome::HistoryItemMissing { index }
            }
        }
    }

    pub fn clear_history(&mut self) -> Outcome {
        self.history.clear();
        Outcome::HistoryCleared
    }

    pub fn toggle_angle_unit(&mut self) -> Outcome {
        let unit = self.settings.toggle_angle_unit();
        Outcome::AngleUnitChanged { unit }
    }

    /// Record a solver answer as if it were a calculation.
    pub fn record_solution(&mut self, question: &str, answer: &str) -> Outcome {
        self.history.record(question, answer);
        self.current_expression = question.to_string();
        self.current_result = answer.to_string();
        Outcome::Solved {
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }

    fn reset_result_if_empty(&mut self) {
        if self.current_expression.is_empty() {
            self.current_result = "0".to_string();
        }
    }
}

/// Whether an expression is worth evaluating without an explicit command.
///
/// It must contain a digit, must not end with an operator or `(`, must have
/// balanced parentheses, and must not leave a function call open.
pub fn is_complete_expression(expression: &str) -> bool {
    let ends_open = expression
        .chars()
        .last()
        .is_some_and(|c| matches!(c, '+' | '-' | '*' | '/' | '^' | '('));
    let balanced = expression.matches('(').count() == expression.matches(')').count();

    HAS_DIGIT.is_match(expression)
        && !ends_open
        && balanced
        && !UNCLOSED_FUNCTION.is_match(expression)
}

fn negate(number: &str) -> String {
    match number.parse::<f64>() {
        Ok(value) if value == 0.0 => "0".to_string(),
        Ok(value) => format!("{}", -value),
        Err(_) => number.to_string(),
    }
}
