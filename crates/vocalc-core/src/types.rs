//! Shared types for the vocalc core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recognized non-arithmetic voice instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandTag {
    /// Clear the display.
    Clear,
    /// Evaluate the current expression.
    Calculate,
    /// Repeat the last result.
    Repeat,
    /// Open the calculation history.
    History,
}

impl CommandTag {
    /// All tags in detection priority order.
    pub const PRIORITY: [CommandTag; 4] = [
        CommandTag::Clear,
        CommandTag::Calculate,
        CommandTag::Repeat,
        CommandTag::History,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandTag::Clear => "CLEAR",
            CommandTag::Calculate => "CALCULATE",
            CommandTag::Repeat => "REPEAT",
            CommandTag::History => "HISTORY",
        }
    }
}

impl fmt::Display for CommandTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the normalizer made of an utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Normalized {
    /// A control command; no arithmetic parsing happened.
    Command(CommandTag),

    /// A candidate arithmetic expression.
    Expression(String),
}

/// How trigonometric arguments are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnit {
    /// The other unit.
    pub fn toggled(self) -> Self {
        match self {
            AngleUnit::Degrees => AngleUnit::Radians,
            AngleUnit::Radians => AngleUnit::Degrees,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AngleUnit::Degrees => "degrees",
            AngleUnit::Radians => "radians",
        }
    }
}

impl fmt::Display for AngleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display theme. Carried in settings only; rendering is the host's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}
