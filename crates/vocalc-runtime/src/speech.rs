//! Speech service seams.
//!
//! Recognition and synthesis are external, callback-driven services. The
//! host wraps them in these traits; recognizer callbacks are delivered to the
//! voice loop as [`RecognitionEvent`]s over a `tokio::sync::mpsc` channel.

use async_trait::async_trait;
use vocalc_core::RecognitionErrorCode;

use crate::RuntimeError;

/// Callback from a speech recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// The recognizer began a session.
    Started,

    /// Partial transcript. Shown, never evaluated.
    Interim(String),

    /// Final transcript for one utterance.
    Final(String),

    /// The session ended.
    Ended,

    /// The session failed.
    Error(RecognitionErrorCode),
}

/// Continuous speech recognizer.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Begin a recognition session in the given language.
    ///
    /// Returns once the request is accepted. [`RecognitionEvent::Started`]
    /// follows on the event channel.
    async fn start(&self, language: &str) -> Result<(), RuntimeError>;

    /// Stop the running session, if any.
    async fn stop(&self) -> Result<(), RuntimeError>;
}

/// Text-to-speech engine.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Queue `text` for speech.
    async fn speak(&self, text: &str, language: &str, rate: f32) -> Result<(), RuntimeError>;

    /// Drop anything queued or playing.
    async fn cancel(&self);
}

/// Recognizer for hosts that feed transcripts directly (files, stdin).
///
/// Start and stop always succeed and do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecognizer;

#[async_trait]
impl SpeechRecognizer for NullRecognizer {
    async fn start(&self, language: &str) -> Result<(), RuntimeError> {
        tracing::debug!(language = %language, "Recognition start requested");
        Ok(())
    }

    async fn stop(&self) -> Result<(), RuntimeError> {
        Ok(())
    }
}

/// Synthesizer that never produces sound.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSynthesizer;

#[async_trait]
impl SpeechSynthesizer for SilentSynthesizer {
    async fn speak(&self, text: &str, _language: &str, _rate: f32) -> Result<(), RuntimeError> {
        tracing::debug!(text = %text, "Speech suppressed");
        Ok(())
    }

    async fn cancel(&self) {}
}
