//! Delegation of word problems that are not plain arithmetic.
//!
//! The calculator only evaluates expressions. Questions such as "prove that
//! n^3 - n is divisible by 6" go to a [`ProblemSolver`]. The bundled
//! [`HeuristicSolver`] classifies the question and returns guidance.
//! [`SingleFlight`] makes sure only one solve is outstanding at a time.

use async_trait::async_trait;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

use crate::RuntimeError;

/// Shortest text treated as a question.
pub const MIN_QUESTION_LEN: usize = 5;

lazy_static! {
    static ref QUESTION_PREFIX: Regex =
        Regex::new(r"(?i)^(?:prove|show that|divisible by|series|sum of|solve for)").unwrap();
    static ref PROOF: Regex = Regex::new(r"(?i)induction|prove that|show that|divisible by").unwrap();
    static ref SERIES: Regex = Regex::new(r"(?i)series|sum of").unwrap();
    static ref EQUATION: Regex = Regex::new(r"(?i)solve for").unwrap();
}

/// Broad category of a word problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// Induction or divisibility proof
    Proof,
    /// Series or summation
    Series,
    /// Solve for a variable
    Equation,
    General,
}

/// Check that `question` looks like a word problem and classify it.
pub fn classify(question: &str) -> Result<QuestionKind, RuntimeError> {
    let question = question.trim();
    if question.len() < MIN_QUESTION_LEN || question == "0" {
        return Err(RuntimeError::NoQuestion);
    }
    if !QUESTION_PREFIX.is_match(question) {
        return Err(RuntimeError::NotAQuestion);
    }

    let kind = if PROOF.is_match(question) {
        QuestionKind::Proof
    } else if SERIES.is_match(question) {
        QuestionKind::Series
    } else if EQUATION.is_match(question) {
        QuestionKind::Equation
    } else {
        QuestionKind::General
    };
    Ok(kind)
}

/// Answers word problems.
#[async_trait]
pub trait ProblemSolver: Send + Sync {
    async fn solve(&self, question: &str) -> Result<String, RuntimeError>;
}

/// Rule-based solver that explains how to approach a question.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicSolver;

#[async_trait]
impl ProblemSolver for HeuristicSolver {
    async fn solve(&self, question: &str) -> Result<String, RuntimeError> {
        let question = question.trim();
        let kind = classify(question)?;
        tracing::debug!(kind = ?kind, "Question classified");

        let answer = match kind {
            QuestionKind::Proof => format!(
                "For \"{}\", proofs by induction or divisibility need explicit steps: \
                 establish a base case (n=1), assume the claim for n=k, and prove it for n=k+1.",
                question
            ),
            QuestionKind::Series => format!(
                "For \"{}\", look for a pattern and apply the matching summation formula \
                 (arithmetic or geometric), or an integral test for convergence.",
                question
            ),
            QuestionKind::Equation => format!(
                "For \"{}\", isolate the variable with inverse operations. \
                 Harder equations need a numerical or symbolic solver.",
                question
            ),
            QuestionKind::General => format!(
                "For \"{}\", a dedicated computational engine is needed for a full answer.",
                question
            ),
        };
        Ok(answer)
    }
}

/// Allows a single outstanding solve; concurrent calls are rejected with
/// [`RuntimeError::SolverBusy`].
#[derive(Clone)]
pub struct SingleFlight {
    solver: Arc<dyn ProblemSolver>,
    pending: Arc<Mutex<Option<String>>>,
    timeout: Duration,
}

impl SingleFlight {
    pub fn new(solver: Arc<dyn ProblemSolver>, timeout: Duration) -> Self {
        Self {
            solver,
            pending: Arc::new(Mutex::new(None)),
            timeout,
        }
    }

    /// The question currently being solved.
    pub fn pending(&self) -> Option<String> {
        self.pending.lock().clone()
    }

    pub async fn solve(&self, question: &str) -> Result<String, RuntimeError> {
        let _flight = self.begin(question)?;
        tracing::info!(question = %question, "Solving question");

        match tokio::time::timeout(self.timeout, self.solver.solve(question)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Solver timed out");
                Err(RuntimeError::Timeout(self.timeout))
            }
        }
    }

    fn begin(&self, question: &str) -> Result<FlightGuard, RuntimeError> {
        let mut pending = self.pending.lock();
        if let Some(current) = pending.as_ref() {
            tracing::warn!(pending = %current, "Solver busy, request rejected");
            return Err(RuntimeError::SolverBusy);
        }
        *pending = Some(question.to_string());
        Ok(FlightGuard {
            pending: Arc::clone(&self.pending),
        })
    }
}

/// Clears the pending slot when the solve finishes or is dropped.
struct FlightGuard {
    pending: Arc<Mutex<Option<String>>>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        *self.pending.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tokio::sync::Notify;

    #[test]
    fn test_classify() {
        assert_eq!(
            classify("prove that n^3 - n is divisible by 6").unwrap(),
            QuestionKind::Proof
        );
        assert_eq!(classify("Sum of the first n odd numbers").unwrap(), QuestionKind::Series);
        assert_eq!(classify("solve for x: 2x + 3 = 7").unwrap(), QuestionKind::Equation);
        assert_eq!(classify("prove Fermat's little theorem").unwrap(), QuestionKind::General);
    }

    #[test]
    fn test_rejects_short_and_arithmetic_input() {
        assert!(matches!(classify("0"), Err(RuntimeError::NoQuestion)));
        assert!(matches!(classify("  2+2 "), Err(RuntimeError::NoQuestion)));
        assert!(matches!(classify("12345 + 678"), Err(RuntimeError::NotAQuestion)));
    }

    #[tokio::test]
    async fn test_heuristic_answers_mention_question() {
        let answer = HeuristicSolver.solve("series 1 + 1/2 + 1/4").await.unwrap();
        assert!(answer.contains("series 1 + 1/2 + 1/4"));
        assert!(answer.contains("summation"));
    }

    struct BlockingSolver {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ProblemSolver for BlockingSolver {
        async fn solve(&self, _question: &str) -> Result<String, RuntimeError> {
            self.release.notified().await;
            Ok("done".to_string())
        }
    }

    #[tokio::test]
    async fn test_concurrent_solve_rejected() {
        let release = Arc::new(Notify::new());
        let flight = SingleFlight::new(
            Arc::new(BlockingSolver {
                release: release.clone(),
            }),
            Duration::from_secs(10),
        );

        let first = tokio::spawn({
            let flight = flight.clone();
            async move { flight.solve("prove that 2 is even").await }
        });
        while flight.pending().is_none() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            flight.solve("sum of 1 to 10").await,
            Err(RuntimeError::SolverBusy)
        ));

        release.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), "done");
        assert!(flight.pending().is_none());

        // Slot is free again.
        let flight_again = flight.clone();
        let next = tokio::spawn(async move { flight_again.solve("series").await });
        while flight.pending().is_none() {
            tokio::task::yield_now().await;
        }
        release.notify_one();
        assert!(next.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_frees_slot() {
        let flight = SingleFlight::new(
            Arc::new(BlockingSolver {
                release: Arc::new(Notify::new()),
            }),
            Duration::from_secs(1),
        );

        assert!(matches!(
            flight.solve("prove that 1 = 1").await,
            Err(RuntimeError::Timeout(_))
        ));
        assert!(flight.pending().is_none());
    }

    proptest! {
        #[test]
        fn prop_arithmetic_is_never_a_question(input in "[0-9+*/(). -]{0,40}") {
            prop_assert!(classify(&input).is_err());
        }

        #[test]
        fn prop_prefixed_questions_classify(
            prefix in prop::sample::select(vec!["prove", "show that", "divisible by", "series", "sum of", "solve for"]),
            rest in "[a-z0-9 ]{0,30}",
        ) {
            let question = format!("{} {}", prefix, rest);
            prop_assert!(classify(&question).is_ok());
        }
    }
}
