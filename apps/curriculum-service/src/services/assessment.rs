//! Async driver for an [`AssessmentSession`].
//!
//! The session itself never sleeps; it hands out tickets. The runner turns
//! those tickets into tokio timers and keeps their handles so a reset, finish
//! or drop can cancel them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use curriculum_core::{
    Advance, AnswerSubmission, AssessmentSession, AssessmentSettings, Classification,
    MatchingEngine, MatchingState, PickOutcome, Quiz, SessionState, Side, SubmitOutcome, WrongPair,
};
use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::generator::ContentGenerator;

fn lock(session: &Mutex<AssessmentSession>) -> MutexGuard<'_, AssessmentSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owned view of the matching board for the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingSnapshot {
    pub state: MatchingState,
    pub left_pool: Vec<String>,
    pub right_pool: Vec<String>,
    pub matched: Vec<(String, String)>,
    pub pending_left: Option<String>,
    pub pending_right: Option<String>,
    pub wrong_pair: Option<WrongPair>,
}

impl From<&MatchingEngine> for MatchingSnapshot {
    fn from(engine: &MatchingEngine) -> Self {
        Self {
            state: engine.state(),
            left_pool: engine.left_pool().to_vec(),
            right_pool: engine.right_pool().to_vec(),
            matched: engine.matched().to_vec(),
            pending_left: engine.pending(Side::Left).map(str::to_string),
            pending_right: engine.pending(Side::Right).map(str::to_string),
            wrong_pair: engine.wrong_pair().cloned(),
        }
    }
}

/// Owned view of a session, safe to hand to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub state: SessionState,
    pub index: usize,
    pub total: usize,
    pub correct_count: u32,
    pub current: Option<Quiz>,
    pub last_result: Option<bool>,
    pub advance_pending: bool,
    pub matching: Option<MatchingSnapshot>,
    pub classification: Option<Classification>,
}

impl From<&AssessmentSession> for SessionSnapshot {
    fn from(session: &AssessmentSession) -> Self {
        Self {
            run_id: session.run_id(),
            started_at: session.started_at(),
            state: session.state(),
            index: session.index(),
            total: session.total(),
            correct_count: session.correct_count(),
            current: session.current().cloned(),
            last_result: session.last_result(),
            advance_pending: session.pending_advance().is_some(),
            matching: session.matching().map(MatchingSnapshot::from),
            classification: session.classification().cloned(),
        }
    }
}

/// Runs one placement assessment with auto-advance and matching feedback
/// timers.
pub struct AssessmentRunner {
    session: Arc<Mutex<AssessmentSession>>,
    generator: Arc<dyn ContentGenerator>,
    advance_task: Option<JoinHandle<()>>,
    feedback_task: Option<JoinHandle<()>>,
}

impl AssessmentRunner {
    /// Fetch a placement list from the generator and start a session on it.
    pub async fn start(generator: Arc<dyn ContentGenerator>, settings: AssessmentSettings) -> Result<Self> {
        let quizzes = generator
            .generate_quiz_list()
            .await
            .map_err(ServiceError::generation)?;
        let session = AssessmentSession::new(quizzes, settings);
        tracing::info!(
            run_id = %session.run_id(),
            total = session.total(),
            generator = generator.name(),
            "assessment started"
        );
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            generator,
            advance_task: None,
            feedback_task: None,
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(&*lock(&self.session))
    }

    /// Grade the current answer. A graded, non-final answer schedules the
    /// advance to the next question.
    pub fn submit(&mut self, submission: AnswerSubmission) -> Result<SubmitOutcome> {
        let outcome = lock(&self.session).submit(submission)?;
        if let SubmitOutcome::Graded {
            advance: Advance::Scheduled(ticket),
            ..
        } = outcome
        {
            let session = Arc::clone(&self.session);
            abort(self.advance_task.take());
            self.advance_task = Some(tokio::spawn(async move {
                tokio::time::sleep(ticket.delay()).await;
                let advanced = lock(&session).advance(ticket);
                tracing::debug!(index = ticket.index(), advanced, "auto-advance fired");
            }));
        }
        Ok(outcome)
    }

    /// Pick a term on the current matching question. A wrong pair schedules
    /// the feedback flag to clear.
    pub fn pick(&mut self, side: Side, value: &str) -> Result<PickOutcome> {
        let (outcome, run_id, index, delay) = {
            let mut session = lock(&self.session);
            let outcome = session.pick(side, value)?;
            (
                outcome,
                session.run_id(),
                session.index(),
                session.settings().feedback_delay(),
            )
        };
        if let PickOutcome::Mismatched(ticket) = outcome {
            let session = Arc::clone(&self.session);
            abort(self.feedback_task.take());
            self.feedback_task = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let mut session = lock(&session);
                // Feedback tickets are per engine, so pin them to the question.
                if session.run_id() == run_id && session.index() == index {
                    let cleared = session.clear_feedback(ticket);
                    tracing::debug!(index, cleared, "matching feedback cleared");
                }
            }));
        }
        Ok(outcome)
    }

    /// Close the assessment after the last answer and return the band.
    pub fn finish(&mut self) -> Result<Classification> {
        let classification = lock(&self.session).finish()?;
        abort(self.feedback_task.take());
        Ok(classification)
    }

    /// Fetch a fresh list, then cancel pending timers and start over.
    ///
    /// If the fetch fails nothing changes: the session keeps its contents and
    /// any scheduled advance or feedback clear still fires.
    pub async fn reset(&mut self) -> Result<()> {
        let quizzes = self
            .generator
            .generate_quiz_list()
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "placement list fetch failed; session left as is");
                ServiceError::generation(err)
            })?;
        self.cancel_timers();
        lock(&self.session).reset(quizzes);
        Ok(())
    }

    fn cancel_timers(&mut self) {
        abort(self.advance_task.take());
        abort(self.feedback_task.take());
    }
}

impl Drop for AssessmentRunner {
    fn drop(&mut self) {
        self.cancel_timers();
    }
}

fn abort(task: Option<JoinHandle<()>>) {
    if let Some(task) = task {
        task.abort();
    }
}
