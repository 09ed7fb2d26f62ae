//! Single-slot cancellable timers.
//!
//! Scheduling aborts whatever was pending in the same slot, so at most one
//! restart (or one auto-calculation) is ever outstanding. A fire that raced
//! with a cancel is detected by its generation and dropped.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Which slot a timer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Restart,
    AutoCalculate,
}

/// Message sent when a timer elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub kind: TimerKind,
    pub generation: u64,
}

pub struct SlotTimer {
    kind: TimerKind,
    sender: mpsc::UnboundedSender<TimerFired>,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl SlotTimer {
    pub fn new(kind: TimerKind, sender: mpsc::UnboundedSender<TimerFired>) -> Self {
        Self {
            kind,
            sender,
            generation: 0,
            pending: None,
        }
    }

    /// Arm the timer, replacing any pending one.
    pub fn schedule(&mut self, delay: Duration) {
        self.cancel();
        self.generation += 1;

        let fired = TimerFired {
            kind: self.kind,
            generation: self.generation,
        };
        let sender = self.sender.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the loop has shut down.
            let _ = sender.send(fired);
        }));

        tracing::debug!(kind = ?self.kind, delay = ?delay, generation = self.generation, "Timer scheduled");
    }

    /// Disarm the timer. Safe to call when nothing is pending.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
            tracing::debug!(kind = ?self.kind, generation = self.generation, "Timer cancelled");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume a fire for this slot. Returns `false` for stale fires.
    pub fn accept(&mut self, fired: TimerFired) -> bool {
        let current =
            fired.kind == self.kind && fired.generation == self.generation && self.pending.is_some();
        if current {
            self.pending = None;
        } else {
            tracing::debug!(kind = ?fired.kind, generation = fired.generation, "Stale timer ignored");
        }
        current
    }
}

impl Drop for SlotTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
