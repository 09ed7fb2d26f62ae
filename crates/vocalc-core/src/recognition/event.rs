//! Events fed to the recognition supervisor

use super::state::RecognitionErrorCode;

/// Inputs to [`super::transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User intent
    StartRequested,
    StopRequested,

    // Recognizer lifecycle
    Started,
    Ended,
    Errored(RecognitionErrorCode),

    // Scheduler
    RestartTimerFired,
}
