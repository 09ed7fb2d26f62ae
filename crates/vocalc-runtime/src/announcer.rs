//! Speech output with silent degradation.

use std::sync::Arc;
use vocalc_core::Settings;

use crate::speech::SpeechSynthesizer;

/// What happened to an announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    Spoken,
    /// Voice feedback is turned off.
    Skipped,
    /// The synthesizer failed; the error has been logged.
    Failed(String),
}

/// Speaks results and prompts through a [`SpeechSynthesizer`].
///
/// Each announcement cancels whatever is still playing. Failures never
/// propagate: they are logged and returned as [`Announcement::Failed`].
#[derive(Clone)]
pub struct Announcer {
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Announcer {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { synthesizer }
    }

    pub async fn announce(&self, text: &str, settings: &Settings) -> Announcement {
        if !settings.voice_feedback() {
            tracing::debug!(text = %text, "Speech skipped, voice feedback disabled");
            return Announcement::Skipped;
        }

        self.synthesizer.cancel().await;
        match self
            .synthesizer
            .speak(text, settings.language(), settings.voice_speed())
            .await
        {
            Ok(()) => {
                tracing::debug!(text = %text, "Speaking");
                Announcement::Spoken
            }
            Err(e) => {
                tracing::warn!(error = %e, "Text-to-speech failed");
                Announcement::Failed(e.to_string())
            }
        }
    }
}
