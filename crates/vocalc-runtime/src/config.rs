//! Runtime timing configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vocalc_core::RestartPolicy;

use crate::RuntimeError;

/// Delays and timeouts for the voice loop.
///
/// Durations are written in human-readable form (`"500ms"`, `"1s"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Wait before evaluating a complete spoken expression
    #[serde(with = "humantime_duration")]
    pub auto_calculate_delay: Duration,

    /// Restart delay after recognition ends on its own
    #[serde(with = "humantime_duration")]
    pub restart_after_end: Duration,

    /// Restart delay after a recoverable recognition error
    #[serde(with = "humantime_duration")]
    pub restart_after_error: Duration,

    /// Upper bound on a single solver call
    #[serde(with = "humantime_duration")]
    pub solver_timeout: Duration,
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let restart = RestartPolicy::default();
        Self {
            auto_calculate_delay: Duration::from_millis(500),
            restart_after_end: restart.end_delay,
            restart_after_error: restart.error_delay,
            solver_timeout: Duration::from_secs(10),
        }
    }
}

impl RuntimeConfig {
    /// Parse from a JSON string; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, RuntimeError> {
        serde_json::from_str(json).map_err(|e| RuntimeError::Config(e.to_string()))
    }

    /// Restart delays for the recognition supervisor.
    pub fn restart_policy(&self) -> RestartPolicy {
        RestartPolicy {
            end_delay: self.restart_after_end,
            error_delay: self.restart_after_error,
        }
    }
}
