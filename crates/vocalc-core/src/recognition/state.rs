//! Recognition supervisor state and error codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Reason codes reported by a speech recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecognitionErrorCode {
    NoSpeech,
    AudioCapture,
    NotAllowed,
    Network,
    Aborted,
    LanguageNotSupported,
    ServiceNotAllowed,
    /// Any code this crate does not know about
    Other(String),
}

impl RecognitionErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            RecognitionErrorCode::NoSpeech => "no-speech",
            RecognitionErrorCode::AudioCapture => "audio-capture",
            RecognitionErrorCode::NotAllowed => "not-allowed",
            RecognitionErrorCode::Network => "network",
            RecognitionErrorCode::Aborted => "aborted",
            RecognitionErrorCode::LanguageNotSupported => "language-not-supported",
            RecognitionErrorCode::ServiceNotAllowed => "service-not-allowed",
            RecognitionErrorCode::Other(code) => code,
        }
    }

    /// Message shown to the user when this error occurs.
    pub fn user_message(&self) -> &'static str {
        match self {
            RecognitionErrorCode::NoSpeech => "No speech detected. Please speak loudly and clearly.",
            RecognitionErrorCode::AudioCapture => "Cannot access microphone. Check permissions.",
            RecognitionErrorCode::NotAllowed => "Microphone access denied. Please allow access.",
            RecognitionErrorCode::Network => "Network error. Check internet connection.",
            RecognitionErrorCode::Aborted => "Voice recognition stopped.",
            RecognitionErrorCode::LanguageNotSupported => "Voice language not supported.",
            RecognitionErrorCode::ServiceNotAllowed => "Voice service not available.",
            RecognitionErrorCode::Other(_) => "Voice recognition error",
        }
    }

    /// Errors that need the user to act before listening can resume.
    pub fn blocks_restart(&self) -> bool {
        matches!(
            self,
            RecognitionErrorCode::NotAllowed | RecognitionErrorCode::AudioCapture
        )
    }
}

impl FromStr for RecognitionErrorCode {
    type Err = std::convert::Infallible;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Ok(match code {
            "no-speech" => RecognitionErrorCode::NoSpeech,
            "audio-capture" => RecognitionErrorCode::AudioCapture,
            "not-allowed" => RecognitionErrorCode::NotAllowed,
            "network" => RecognitionErrorCode::Network,
            "aborted" => RecognitionErrorCode::Aborted,
            "language-not-supported" => RecognitionErrorCode::LanguageNotSupported,
            "service-not-allowed" => RecognitionErrorCode::ServiceNotAllowed,
            other => RecognitionErrorCode::Other(other.to_string()),
        })
    }
}

impl From<String> for RecognitionErrorCode {
    fn from(code: String) -> Self {
        match code.parse() {
            Ok(parsed) => parsed,
            Err(never) => match never {},
        }
    }
}

impl From<RecognitionErrorCode> for String {
    fn from(code: RecognitionErrorCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for RecognitionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supervisor state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RecognitionState {
    /// Not listening, and the user has not asked to.
    #[default]
    Idle,

    /// A recognition session is running.
    Listening,

    /// The session ended on its own; a restart is scheduled.
    Restarting { delay: Duration },

    /// A permission or device failure stopped listening until the user
    /// starts it again.
    Blocked { reason: RecognitionErrorCode },
}

impl RecognitionState {
    /// Whether the user currently intends to be listening.
    pub fn wants_listening(&self) -> bool {
        matches!(
            self,
            RecognitionState::Listening | RecognitionState::Restarting { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            RecognitionState::Idle => "idle",
            RecognitionState::Listening => "listening",
            RecognitionState::Restarting { .. } => "restarting",
            RecognitionState::Blocked { .. } => "blocked",
        }
    }
}

/// Restart delays, taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Delay after a session ends normally
    pub end_delay: Duration,

    /// Delay after a recoverable error
    pub error_delay: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            end_delay: Duration::from_millis(500),
            error_delay: Duration::from_millis(1000),
        }
    }
}
