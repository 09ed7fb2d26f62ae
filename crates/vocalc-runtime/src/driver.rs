//! The voice loop.
//!
//! A single task owns the [`Session`] and the recognition supervisor state.
//! It multiplexes recognizer callbacks, host controls, timer fires and solver
//! completions, so no state is ever shared or locked.
//!
//! ```text
//! Recognizer ──events──▶ ┌──────────┐ ──feedback──▶ FeedbackSink
//! Host ───────controls─▶ │ VoiceLoop│ ──speech────▶ Announcer
//! Timers ─────fires────▶ └──────────┘ ──start/stop▶ Recognizer
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use vocalc_core::recognition::{self, Effect, Event};
use vocalc_core::{Outcome, RecognitionErrorCode, RecognitionState, RestartPolicy, Session};

use crate::announcer::Announcer;
use crate::config::RuntimeConfig;
use crate::solver::SingleFlight;
use crate::speech::{RecognitionEvent, SpeechRecognizer};
use crate::timer::{SlotTimer, TimerFired, TimerKind};
use crate::RuntimeError;

/// Instructions from the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    StartListening,
    StopListening,
    /// Evaluate the current expression now.
    Calculate,
    /// Hand a word problem to the solver.
    Solve(String),
    /// Finish pending work and return the session.
    Shutdown,
}

/// Everything the loop reports back to the display.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    /// Partial transcript
    Hearing(String),
    /// Supervisor status message
    Status(String),
    /// Result of a session operation
    Outcome(Outcome),
    /// Solver rejected or failed
    SolverError(String),
}

/// Receives loop feedback, e.g. a terminal or a UI channel.
pub trait FeedbackSink: Send + Sync {
    fn feedback(&self, feedback: Feedback);
}

impl FeedbackSink for mpsc::UnboundedSender<Feedback> {
    fn feedback(&self, feedback: Feedback) {
        // A closed display is not the loop's problem.
        let _ = self.send(feedback);
    }
}

struct Solved {
    question: String,
    result: Result<String, RuntimeError>,
}

/// Drives a [`Session`] from speech events.
pub struct VoiceLoop {
    session: Session,
    state: RecognitionState,
    policy: RestartPolicy,
    config: RuntimeConfig,
    recognizer: Arc<dyn SpeechRecognizer>,
    announcer: Announcer,
    sink: Arc<dyn FeedbackSink>,
    solver: SingleFlight,
    restart_timer: SlotTimer,
    calc_timer: SlotTimer,
    timer_rx: mpsc::UnboundedReceiver<TimerFired>,
    solved_tx: mpsc::UnboundedSender<Solved>,
    solved_rx: mpsc::UnboundedReceiver<Solved>,
}

impl VoiceLoop {
    pub fn new(
        session: Session,
        config: RuntimeConfig,
        recognizer: Arc<dyn SpeechRecognizer>,
        announcer: Announcer,
        solver: SingleFlight,
        sink: Arc<dyn FeedbackSink>,
    ) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (solved_tx, solved_rx) = mpsc::unbounded_channel();
        Self {
            session,
            state: RecognitionState::Idle,
            policy: config.restart_policy(),
            config,
            recognizer,
            announcer,
            sink,
            solver,
            restart_timer: SlotTimer::new(TimerKind::Restart, timer_tx.clone()),
            calc_timer: SlotTimer::new(TimerKind::AutoCalculate, timer_tx),
            timer_rx,
            solved_tx,
            solved_rx,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> &RecognitionState {
        &self.state
    }

    /// Run until [`Control::Shutdown`] or until the recognizer's event
    /// channel closes. A pending auto-calculation is carried out before
    /// returning.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<RecognitionEvent>,
        mut controls: mpsc::Receiver<Control>,
    ) -> Session {
        let mut controls_open = true;
        tracing::info!("Voice loop started");

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.on_recognition(event).await,
                    None => break,
                },
                control = controls.recv(), if controls_open => match control {
                    Some(Control::Shutdown) => break,
                    Some(control) => self.on_control(control).await,
                    None => controls_open = false,
                },
                Some(fired) = self.timer_rx.recv() => self.on_timer(fired).await,
                Some(solved) = self.solved_rx.recv() => self.on_solved(solved),
            }
        }

        self.shutdown().await
    }

    async fn shutdown(mut self) -> Session {
        if self.calc_timer.is_pending() {
            self.calc_timer.cancel();
            let outcome = self.session.calculate();
            self.report(outcome).await;
        }
        self.restart_timer.cancel();
        if self.state.wants_listening() {
            if let Err(e) = self.recognizer.stop().await {
                tracing::warn!(error = %e, "Failed to stop recognizer on shutdown");
            }
        }
        tracing::info!(history_len = self.session.history().len(), "Voice loop stopped");
        self.session
    }

    async fn on_recognition(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Started => self.apply(Event::Started).await,
            RecognitionEvent::Ended => self.apply(Event::Ended).await,
            RecognitionEvent::Error(code) => {
                tracing::warn!(code = %code, "Recognition error");
                self.apply(Event::Errored(code)).await
            }
            RecognitionEvent::Interim(text) => self.sink.feedback(Feedback::Hearing(text)),
            RecognitionEvent::Final(text) => self.on_transcript(&text).await,
        }
    }

    async fn on_transcript(&mut self, transcript: &str) {
        // A new utterance supersedes any pending auto-calculation.
        self.calc_timer.cancel();

        let outcome = self.session.handle_transcript(transcript);
        if let Outcome::Expression { complete: true, .. } = outcome {
            self.calc_timer.schedule(self.config.auto_calculate_delay);
        }
        self.report(outcome).await;
    }

    async fn on_control(&mut self, control: Control) {
        match control {
            Control::StartListening => self.apply(Event::StartRequested).await,
            Control::StopListening => self.apply(Event::StopRequested).await,
            Control::Calculate => {
                self.calc_timer.cancel();
                let outcome = self.session.calculate();
                self.report(outcome).await;
            }
            Control::Solve(question) => self.spawn_solve(question),
            Control::Shutdown => {}
        }
    }

    async fn on_timer(&mut self, fired: TimerFired) {
        match fired.kind {
            TimerKind::Restart if self.restart_timer.accept(fired) => {
                self.apply(Event::RestartTimerFired).await
            }
            TimerKind::AutoCalculate if self.calc_timer.accept(fired) => {
                let outcome = self.session.calculate();
                self.report(outcome).await;
            }
            _ => {}
        }
    }

    fn spawn_solve(&self, question: String) {
        let solver = self.solver.clone();
        let done = self.solved_tx.clone();
        tokio::spawn(async move {
            let result = solver.solve(&question).await;
            let _ = done.send(Solved { question, result });
        });
    }

    fn on_solved(&mut self, solved: Solved) {
        match solved.result {
            Ok(answer) => {
                let outcome = self.session.record_solution(&solved.question, &answer);
                self.sink.feedback(Feedback::Outcome(outcome));
            }
            Err(e) => {
                tracing::warn!(question = %solved.question, error = %e, "Solve failed");
                self.sink.feedback(Feedback::SolverError(e.to_string()));
            }
        }
    }

    async fn report(&mut self, outcome: Outcome) {
        if let Some(text) = outcome.speak() {
            self.announcer.announce(text, self.session.settings()).await;
        }
        self.sink.feedback(Feedback::Outcome(outcome));
    }

    /// Feed an event through the supervisor and carry out its effects.
    /// Effects may raise follow-up events (a failed start), which are
    /// processed in order.
    async fn apply(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let result = recognition::transition(&self.state, &self.policy, event);
            if result.new_state != self.state {
                tracing::info!(
                    from = self.state.name(),
                    to = result.new_state.name(),
                    "Recognition state changed"
                );
            }
            self.state = result.new_state;

            for effect in result.effects {
                if let Some(follow_up) = self.execute(effect).await {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    async fn execute(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::StartRecognition => {
                let language = self.session.settings().language().to_string();
                match self.recognizer.start(&language).await {
                    Ok(()) => None,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to start recognition");
                        let code = match e {
                            RuntimeError::Recognition(code) => code,
                            other => RecognitionErrorCode::Other(other.to_string()),
                        };
                        Some(Event::Errored(code))
                    }
                }
            }
            Effect::StopRecognition => {
                if let Err(e) = self.recognizer.stop().await {
                    tracing::warn!(error = %e, "Failed to stop recognition");
                }
                None
            }
            Effect::ScheduleRestart { delay } => {
                self.restart_timer.schedule(delay);
                None
            }
            Effect::CancelRestart => {
                self.restart_timer.cancel();
                None
            }
            Effect::Notify { message } => {
                self.sink.feedback(Feedback::Status(message));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::HeuristicSolver;
    use crate::speech::SpeechSynthesizer;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;
    use vocalc_core::Settings;

    #[derive(Default)]
    struct FakeRecognizer {
        starts: Mutex<u32>,
        stops: Mutex<u32>,
        deny: bool,
    }

    #[async_trait]
    impl SpeechRecognizer for FakeRecognizer {
        async fn start(&self, _language: &str) -> Result<(), RuntimeError> {
            *self.starts.lock() += 1;
            if self.deny {
                return Err(RuntimeError::Recognition(RecognitionErrorCode::NotAllowed));
            }
            Ok(())
        }

        async fn stop(&self) -> Result<(), RuntimeError> {
            *self.stops.lock() += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeSynthesizer {
        spoken: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSynthesizer {
        async fn speak(&self, text: &str, _language: &str, _rate: f32) -> Result<(), RuntimeError> {
            self.spoken.lock().push(text.to_string());
            Ok(())
        }

        async fn cancel(&self) {}
    }

    struct Harness {
        events: mpsc::Sender<RecognitionEvent>,
        controls: mpsc::Sender<Control>,
        feedback: mpsc::UnboundedReceiver<Feedback>,
        recognizer: Arc<FakeRecognizer>,
        synthesizer: Arc<FakeSynthesizer>,
        task: tokio::task::JoinHandle<Session>,
    }

    fn spawn_loop(settings: Settings, recognizer: FakeRecognizer) -> Harness {
        let recognizer = Arc::new(recognizer);
        let synthesizer = Arc::new(FakeSynthesizer::default());
        let (feedback_tx, feedback) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::channel(16);
        let (controls, controls_rx) = mpsc::channel(16);

        let config = RuntimeConfig::default();
        let solver = SingleFlight::new(Arc::new(HeuristicSolver), config.solver_timeout);
        let voice_loop = VoiceLoop::new(
            Session::new(settings),
            config,
            recognizer.clone(),
            Announcer::new(synthesizer.clone()),
            solver,
            Arc::new(feedback_tx),
        );
        let task = tokio::spawn(voice_loop.run(events_rx, controls_rx));

        Harness {
            events,
            controls,
            feedback,
            recognizer,
            synthesizer,
            task,
        }
    }

    fn drain(feedback: &mut mpsc::UnboundedReceiver<Feedback>) -> Vec<Feedback> {
        let mut out = Vec::new();
        while let Ok(item) = feedback.try_recv() {
            out.push(item);
        }
        out
    }

    async fn settle() {
        // Let the loop task process everything queued so far.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_expression_auto_calculates_after_delay() {
        let mut h = spawn_loop(Settings::default(), FakeRecognizer::default());

        h.events
            .send(RecognitionEvent::Final("five plus three".to_string()))
            .await
            .unwrap();
        settle().await;
        let first = drain(&mut h.feedback);
        assert!(first.iter().any(|f| matches!(
            f,
            Feedback::Outcome(Outcome::Expression { complete: true, .. })
        )));
        assert!(!first
            .iter()
            .any(|f| matches!(f, Feedback::Outcome(Outcome::Calculated { .. }))));

        tokio::time::sleep(Duration::from_millis(600)).await;
        settle().await;
        let later = drain(&mut h.feedback);
        assert!(later.iter().any(|f| matches!(
            f,
            Feedback::Outcome(Outcome::Calculated { result, .. }) if result == "8"
        )));

        h.controls.send(Control::Shutdown).await.unwrap();
        let session = h.task.await.unwrap();
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_incomplete_expression_waits() {
        let mut h = spawn_loop(Settings::default(), FakeRecognizer::default());

        h.events
            .send(RecognitionEvent::Final("five plus".to_string()))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert!(!drain(&mut h.feedback)
            .iter()
            .any(|f| matches!(f, Feedback::Outcome(Outcome::Calculated { .. }))));

        h.controls.send(Control::Shutdown).await.unwrap();
        assert!(h.task.await.unwrap().history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_calculation() {
        let h = spawn_loop(Settings::default(), FakeRecognizer::default());

        h.events
            .send(RecognitionEvent::Final("six times seven".to_string()))
            .await
            .unwrap();
        settle().await;
        h.controls.send(Control::Shutdown).await.unwrap();

        let session = h.task.await.unwrap();
        assert_eq!(session.current_result(), "42");
    }

    #[tokio::test(start_paused = true)]
    async fn test_recognition_restarts_after_end() {
        let mut h = spawn_loop(Settings::default(), FakeRecognizer::default());

        h.controls.send(Control::StartListening).await.unwrap();
        settle().await;
        assert_eq!(*h.recognizer.starts.lock(), 1);

        h.events.send(RecognitionEvent::Ended).await.unwrap();
        settle().await;
        assert_eq!(*h.recognizer.starts.lock(), 1);

        tokio::time::sleep(Duration::from_millis(550)).await;
        settle().await;
        assert_eq!(*h.recognizer.starts.lock(), 2);

        let statuses: Vec<_> = drain(&mut h.feedback)
            .into_iter()
            .filter_map(|f| match f {
                Feedback::Status(s) => Some(s),
                _ => None,
            })
            .collect();
        assert!(statuses.contains(&"Microphone re-calibrating...".to_string()));

        h.controls.send(Control::Shutdown).await.unwrap();
        h.task.await.unwrap();
        assert_eq!(*h.recognizer.stops.lock(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_restart() {
        let h = spawn_loop(Settings::default(), FakeRecognizer::default());

        h.controls.send(Control::StartListening).await.unwrap();
        h.events.send(RecognitionEvent::Ended).await.unwrap();
        settle().await;
        h.controls.send(Control::StopListening).await.unwrap();
        settle().await;

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(*h.recognizer.starts.lock(), 1);

        h.controls.send(Control::Shutdown).await.unwrap();
        h.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_start_blocks_without_retry() {
        let h = spawn_loop(
            Settings::default(),
            FakeRecognizer {
                deny: true,
                ..Default::default()
            },
        );

        h.controls.send(Control::StartListening).await.unwrap();
        settle().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(*h.recognizer.starts.lock(), 1);

        h.controls.send(Control::Shutdown).await.unwrap();
        h.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_is_spoken() {
        let h = spawn_loop(Settings::default(), FakeRecognizer::default());

        for line in ["two plus two", "calculate", "repeat"] {
            h.events
                .send(RecognitionEvent::Final(line.to_string()))
                .await
                .unwrap();
            settle().await;
        }
        h.controls.send(Control::Shutdown).await.unwrap();
        h.task.await.unwrap();

        assert_eq!(*h.synthesizer.spoken.lock(), vec!["Last result: 4"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_solve_records_answer() {
        let mut h = spawn_loop(Settings::default(), FakeRecognizer::default());

        h.controls
            .send(Control::Solve("sum of the first ten integers".to_string()))
            .await
            .unwrap();
        settle().await;
        let feedback = drain(&mut h.feedback);
        assert!(feedback
            .iter()
            .any(|f| matches!(f, Feedback::Outcome(Outcome::Solved { .. }))));

        h.controls
            .send(Control::Solve("2+2".to_string()))
            .await
            .unwrap();
        settle().await;
        assert!(drain(&mut h.feedback)
            .iter()
            .any(|f| matches!(f, Feedback::SolverError(_))));

        h.controls.send(Control::Shutdown).await.unwrap();
        let session = h.task.await.unwrap();
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interim_only_displayed() {
        let mut h = spawn_loop(Settings::default(), FakeRecognizer::default());

        h.events
            .send(RecognitionEvent::Interim("five plus".to_string()))
            .await
            .unwrap();
        settle().await;
        assert_eq!(
            drain(&mut h.feedback),
            vec![Feedback::Hearing("five plus".to_string())]
        );

        drop(h.events);
        let session = h.task.await.unwrap();
        assert_eq!(session.current_expression(), "");
    }
}
