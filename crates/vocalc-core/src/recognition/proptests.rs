//! Property-based tests for the recognition supervisor
//!
//! These tests check the restart policy over arbitrary event sequences.

use super::*;
use proptest::prelude::*;

fn arb_error_code() -> impl Strategy<Value = RecognitionErrorCode> {
    prop_oneof![
        Just(RecognitionErrorCode::NoSpeech),
        Just(RecognitionErrorCode::AudioCapture),
        Just(RecognitionErrorCode::NotAllowed),
        Just(RecognitionErrorCode::Network),
        Just(RecognitionErrorCode::Aborted),
        Just(RecognitionErrorCode::LanguageNotSupported),
        Just(RecognitionErrorCode::ServiceNotAllowed),
        "[a-z]{3,10}".prop_map(RecognitionErrorCode::from),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::StartRequested),
        Just(Event::StopRequested),
        Just(Event::Started),
        Just(Event::Ended),
        arb_error_code().prop_map(Event::Errored),
        Just(Event::RestartTimerFired),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Every scheduled restart replaces any pending one and uses a configured delay.
    #[test]
    fn prop_schedule_is_preceded_by_cancel(events in proptest::collection::vec(arb_event(), 0..40)) {
        let policy = RestartPolicy::default();
        let mut state = RecognitionState::Idle;

        for event in events {
            let result = transition(&state, &policy, event);
            for (i, effect) in result.effects.iter().enumerate() {
                if let Effect::ScheduleRestart { delay } = effect {
                    prop_assert!(i > 0 && result.effects[i - 1] == Effect::CancelRestart);
                    prop_assert!(*delay == policy.end_delay || *delay == policy.error_delay);
                }
            }
            state = result.new_state;
        }
    }

    // Without the user's intent, recognition never starts.
    #[test]
    fn prop_no_start_without_intent(events in proptest::collection::vec(arb_event(), 0..40)) {
        let policy = RestartPolicy::default();
        let mut state = RecognitionState::Idle;

        for event in events {
            let requested = event == Event::StartRequested;
            let was_restarting = matches!(state, RecognitionState::Restarting { .. });
            let result = transition(&state, &policy, event);

            if result.effects.contains(&Effect::StartRecognition) {
                prop_assert!(requested || was_restarting);
            }
            state = result.new_state;
        }
    }

    // Stop always lands in Idle, whatever came before.
    #[test]
    fn prop_stop_always_idles(events in proptest::collection::vec(arb_event(), 0..40)) {
        let policy = RestartPolicy::default();
        let mut state = RecognitionState::Idle;
        for event in events {
            state = transition(&state, &policy, event).new_state;
        }
        let result = transition(&state, &policy, Event::StopRequested);
        prop_assert_eq!(result.new_state, RecognitionState::Idle);
        prop_assert!(result.effects.contains(&Effect::CancelRestart));
    }

    // Blocking errors clear intent; nothing but a start request leaves Blocked.
    #[test]
    fn prop_blocked_is_sticky(events in proptest::collection::vec(arb_event(), 0..40)) {
        let policy = RestartPolicy::default();
        let mut state = RecognitionState::Blocked { reason: RecognitionErrorCode::NotAllowed };

        for event in events {
            let leaving = matches!(event, Event::StartRequested | Event::StopRequested);
            let was_blocked = matches!(state, RecognitionState::Blocked { .. });
            let result = transition(&state, &policy, event);
            if was_blocked && !leaving {
                let still_blocked = matches!(result.new_state, RecognitionState::Blocked { .. });
                prop_assert!(still_blocked);
                prop_assert!(!result.new_state.wants_listening());
            }
            state = result.new_state;
        }
    }

    #[test]
    fn prop_error_codes_round_trip_through_strings(code in arb_error_code()) {
        let text = code.to_string();
        prop_assert_eq!(RecognitionErrorCode::from(text), code);
    }
}
