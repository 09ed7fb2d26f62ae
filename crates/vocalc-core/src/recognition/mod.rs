//! Continuous recognition supervisor
//!
//! Keeps a speech recognizer running while the user wants to listen,
//! restarting it after it ends on its own or fails, and stopping for good on
//! permission and device errors. The state machine is pure: the host feeds
//! [`Event`]s in and carries out the returned [`Effect`]s.

mod effect;
pub mod event;
pub mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{RecognitionErrorCode, RecognitionState, RestartPolicy};
pub use transition::{transition, TransitionResult};
