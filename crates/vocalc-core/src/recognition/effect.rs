//! Effects produced by supervisor transitions

use std::time::Duration;

/// Side effects for the host to carry out after a transition, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Begin a recognition session
    StartRecognition,

    /// Stop the running recognition session
    StopRecognition,

    /// Arm the single restart timer
    ScheduleRestart { delay: Duration },

    /// Disarm the restart timer if it is pending
    CancelRestart,

    /// Show a message to the user
    Notify { message: String },
}

impl Effect {
    pub fn notify(message: impl Into<String>) -> Self {
        Effect::Notify {
            message: message.into(),
        }
    }
}
