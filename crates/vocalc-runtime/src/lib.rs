//! # vocalc-runtime
//!
//! Async speech glue for vocalc.
//!
//! This crate connects the deterministic core in `vocalc-core` to
//! asynchronous speech services:
//! - keeps continuous recognition alive with a restart supervisor
//! - speaks results, degrading silently when synthesis fails
//! - auto-calculates complete spoken expressions after a short pause
//! - delegates word problems to a solver, one at a time
//!
//! ## Important
//!
//! Nothing here does arithmetic. All normalization and evaluation happens in
//! `vocalc-core`; this crate only schedules it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use vocalc_runtime::{Announcer, HeuristicSolver, NullRecognizer, RuntimeConfig,
//!     SilentSynthesizer, SingleFlight, VoiceLoop};
//!
//! let config = RuntimeConfig::default();
//! let solver = SingleFlight::new(Arc::new(HeuristicSolver), config.solver_timeout);
//! let voice_loop = VoiceLoop::new(session, config, Arc::new(NullRecognizer),
//!     Announcer::new(Arc::new(SilentSynthesizer)), solver, Arc::new(feedback_tx));
//!
//! let session = voice_loop.run(events_rx, controls_rx).await;
//! ```

pub mod announcer;
pub mod config;
pub mod driver;
pub mod solver;
pub mod speech;
pub mod timer;

pub use announcer::{Announcement, Announcer};
pub use config::RuntimeConfig;
pub use driver::{Control, Feedback, FeedbackSink, VoiceLoop};
pub use solver::{classify, HeuristicSolver, ProblemSolver, QuestionKind, SingleFlight};
pub use speech::{
    NullRecognizer, RecognitionEvent, SilentSynthesizer, SpeechRecognizer, SpeechSynthesizer,
};
pub use timer::{SlotTimer, TimerFired, TimerKind};

use std::time::Duration;
use thiserror::Error;
use vocalc_core::RecognitionErrorCode;

/// Errors from the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Speech recognition failed: {0}")]
    Recognition(RecognitionErrorCode),

    #[error("Text-to-speech failed: {0}")]
    Synthesis(String),

    #[error("No question to solve")]
    NoQuestion,

    #[error("This looks like an arithmetic calculation, not a question")]
    NotAQuestion,

    #[error("A question is already being solved")]
    SolverBusy,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid runtime configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RuntimeError::Recognition(RecognitionErrorCode::Network).to_string(),
            "Speech recognition failed: network"
        );
        assert_eq!(
            RuntimeError::SolverBusy.to_string(),
            "A question is already being solved"
        );
    }
}
