//! Pure state transition function

use super::{Effect, Event, RecognitionState, RestartPolicy};

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: RecognitionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: RecognitionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// Whether the transition left the state unchanged and did nothing.
    pub fn is_noop(&self, previous: &RecognitionState) -> bool {
        self.effects.is_empty() && &self.new_state == previous
    }
}

/// Pure transition function. Every event is accepted in every state; events
/// that make no sense in the current state leave it unchanged.
pub fn transition(
    state: &RecognitionState,
    policy: &RestartPolicy,
    event: Event,
) -> TransitionResult {
    use RecognitionState::*;

    match (state, event) {
        // ============================================================
        // User intent
        // ============================================================
        (Idle | Blocked { .. }, Event::StartRequested) => TransitionResult::new(Listening)
            .with_effect(Effect::StartRecognition)
            .with_effect(Effect::notify("Voice recognition started - speak now")),

        (Listening | Restarting { .. }, Event::StartRequested) => {
            TransitionResult::new(state.clone()).with_effect(Effect::notify("Already listening..."))
        }

        (_, Event::StopRequested) => TransitionResult::new(Idle).with_effects([
            Effect::CancelRestart,
            Effect::StopRecognition,
            Effect::notify("Voice recognition stopped."),
        ]),

        // ============================================================
        // Recognizer lifecycle
        // ============================================================
        (Listening, Event::Started) => TransitionResult::new(Listening)
            .with_effect(Effect::notify("Listening for your voice input...")),

        (Restarting { .. }, Event::Started) => {
            TransitionResult::new(Listening).with_effect(Effect::CancelRestart)
        }

        // Nobody asked for this session.
        (Idle | Blocked { .. }, Event::Started) => {
            TransitionResult::new(state.clone()).with_effect(Effect::StopRecognition)
        }

        (Listening, Event::Ended) => schedule_restart(policy.end_delay)
            .with_effect(Effect::notify("Microphone re-calibrating...")),

        (_, Event::Ended) => TransitionResult::new(state.clone()),

        (Listening | Restarting { .. }, Event::Errored(code)) if code.blocks_restart() => {
            let message = code.user_message();
            TransitionResult::new(Blocked { reason: code }).with_effects([
                Effect::CancelRestart,
                Effect::notify(message),
            ])
        }

        (Listening, Event::Errored(code)) => {
            schedule_restart(policy.error_delay).with_effect(Effect::notify(code.user_message()))
        }

        // A restart is already pending; keep its delay.
        (Restarting { .. }, Event::Errored(code)) => {
            TransitionResult::new(state.clone()).with_effect(Effect::notify(code.user_message()))
        }

        (Idle | Blocked { .. }, Event::Errored(_)) => TransitionResult::new(state.clone()),

        // ============================================================
        // Scheduler
        // ============================================================
        (Restarting { .. }, Event::RestartTimerFired) => {
            TransitionResult::new(Listening).with_effect(Effect::StartRecognition)
        }

        // Stale timer from a cancelled restart.
        (_, Event::RestartTimerFired) => TransitionResult::new(state.clone()),
    }
}

fn schedule_restart(delay: std::time::Duration) -> TransitionResult {
    TransitionResult::new(RecognitionState::Restarting { delay })
        .with_effect(Effect::CancelRestart)
        .with_effect(Effect::ScheduleRestart { delay })
}
