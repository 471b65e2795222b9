//! Assessment session: sequences quizzes, grades answers, and classifies the
//! learner once the last question is finished.
//!
//! The session never sleeps. After a graded, non-final answer it hands out an
//! [`AdvanceTicket`]; whoever drives the session waits out the ticket's delay
//! and then calls [`AssessmentSession::advance`]. Every [`reset`] mints a new
//! run id, so tickets issued before the reset are rejected.
//!
//! [`reset`]: AssessmentSession::reset

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::SessionError;
use crate::grading::AnswerSubmission;
use crate::matching::{FeedbackTicket, MatchingEngine, PickOutcome, Side};
use crate::proficiency::Classification;
use crate::quiz::Quiz;
use crate::settings::AssessmentSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    InProgress { index: usize },
    Complete,
}

/// Permission to move past question `index` of run `run_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AdvanceTicket {
    run_id: Uuid,
    index: usize,
    delay_ms: u64,
}

impl AdvanceTicket {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// What happens after a graded answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Call [`AssessmentSession::advance`] with the ticket after its delay.
    Scheduled(AdvanceTicket),
    /// Last question: the caller must invoke [`AssessmentSession::finish`].
    AwaitingFinish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was selected or typed; the session is unchanged.
    Ignored,
    Graded { correct: bool, advance: Advance },
}

#[derive(Debug, Clone)]
pub struct AssessmentSession {
    run_id: Uuid,
    quizzes: Vec<Quiz>,
    index: usize,
    correct_count: u32,
    settings: AssessmentSettings,
    started_at: DateTime<Utc>,
    // Per-question state, cleared on advance.
    submission: Option<AnswerSubmission>,
    last_result: Option<bool>,
    matching: Option<MatchingEngine>,
    pending_advance: Option<AdvanceTicket>,
    classification: Option<Classification>,
}

impl AssessmentSession {
    pub fn new(quizzes: Vec<Quiz>, settings: AssessmentSettings) -> Self {
        let mut session = Self {
            run_id: Uuid::new_v4(),
            quizzes: Vec::new(),
            index: 0,
            correct_count: 0,
            settings,
            started_at: Utc::now(),
            submission: None,
            last_result: None,
            matching: None,
            pending_advance: None,
            classification: None,
        };
        session.load(quizzes);
        session
    }

    /// Start over with a fresh quiz list. Any outstanding advance ticket
    /// becomes stale.
    pub fn reset(&mut self, quizzes: Vec<Quiz>) {
        let previous = self.run_id;
        self.run_id = Uuid::new_v4();
        self.correct_count = 0;
        self.started_at = Utc::now();
        self.classification = None;
        self.load(quizzes);
        tracing::info!(%previous, run_id = %self.run_id, total = self.quizzes.len(), "assessment reset");
    }

    fn load(&mut self, quizzes: Vec<Quiz>) {
        self.quizzes = quizzes;
        self.index = 0;
        self.clear_question_state();
        if self.quizzes.is_empty() {
            self.classification = Some(self.classify());
        }
    }

    fn clear_question_state(&mut self) {
        self.submission = None;
        self.last_result = None;
        self.pending_advance = None;
        self.matching = self
            .quizzes
            .get(self.index)
            .and_then(|quiz| quiz.body.matching_map())
            .map(|pairs| MatchingEngine::new(pairs.clone()));
    }

    fn classify(&self) -> Classification {
        Classification::new(
            &self.settings.thresholds,
            self.correct_count,
            self.quizzes.len(),
            self.settings.reference_length,
        )
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn settings(&self) -> &AssessmentSettings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        if self.index >= self.quizzes.len() {
            SessionState::Complete
        } else {
            SessionState::InProgress { index: self.index }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state() == SessionState::Complete
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.quizzes.len()
    }

    pub fn quizzes(&self) -> &[Quiz] {
        &self.quizzes
    }

    pub fn current(&self) -> Option<&Quiz> {
        self.quizzes.get(self.index)
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn is_submitted(&self) -> bool {
        self.last_result.is_some()
    }

    /// Whether the current question was answered correctly, once submitted.
    pub fn last_result(&self) -> Option<bool> {
        self.last_result
    }

    pub fn submission(&self) -> Option<&AnswerSubmission> {
        self.submission.as_ref()
    }

    /// Matching engine for the current question, if it is a matching quiz.
    pub fn matching(&self) -> Option<&MatchingEngine> {
        self.matching.as_ref()
    }

    pub fn pending_advance(&self) -> Option<AdvanceTicket> {
        self.pending_advance
    }

    pub fn classification(&self) -> Option<&Classification> {
        self.classification.as_ref()
    }

    fn is_last(&self) -> bool {
        self.index + 1 == self.quizzes.len()
    }

    /// Forward a pick to the current question's matching engine.
    pub fn pick(&mut self, side: Side, value: &str) -> Result<PickOutcome, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Complete);
        }
        let index = self.index;
        let engine = self
            .matching
            .as_mut()
            .ok_or(SessionError::NotMatching { index })?;
        Ok(engine.pick(side, value)?)
    }

    /// Drop the wrong-pair flag on the current matching question.
    pub fn clear_feedback(&mut self, ticket: FeedbackTicket) -> bool {
        self.matching
            .as_mut()
            .map(|engine| engine.clear_feedback(ticket))
            .unwrap_or(false)
    }

    /// Grade the answer to the current question.
    ///
    /// Matching questions ignore the submission contents and count as correct
    /// once every pair has been matched.
    pub fn submit(&mut self, submission: AnswerSubmission) -> Result<SubmitOutcome, SessionError> {
        let quiz = self.current().ok_or(SessionError::Complete)?;
        if self.is_submitted() {
            return Err(SessionError::AlreadySubmitted { index: self.index });
        }

        let correct = match grade_question(quiz, &submission) {
            QuestionGrade::Matching => {
                let resolved = self.matching.as_ref().is_some_and(MatchingEngine::is_resolved);
                if !resolved {
                    return Err(SessionError::MatchingUnresolved);
                }
                true
            }
            QuestionGrade::Empty => {
                tracing::debug!(index = self.index, "empty submission ignored");
                return Ok(SubmitOutcome::Ignored);
            }
            QuestionGrade::Graded(correct) => correct,
        };

        if correct {
            self.correct_count += 1;
        }
        self.submission = Some(submission);
        self.last_result = Some(correct);
        tracing::debug!(index = self.index, correct, score = self.correct_count, "answer graded");

        let advance = if self.is_last() {
            Advance::AwaitingFinish
        } else {
            let ticket = AdvanceTicket {
                run_id: self.run_id,
                index: self.index,
                delay_ms: self.settings.advance_delay_ms,
            };
            self.pending_advance = Some(ticket);
            Advance::Scheduled(ticket)
        };

        Ok(SubmitOutcome::Graded { correct, advance })
    }

    /// Move to the next question. Returns false for tickets from an earlier
    /// run or an already-consumed advance.
    pub fn advance(&mut self, ticket: AdvanceTicket) -> bool {
        if ticket.run_id != self.run_id || self.pending_advance != Some(ticket) {
            tracing::debug!(run_id = %ticket.run_id, index = ticket.index, "stale advance ignored");
            return false;
        }
        self.index += 1;
        self.clear_question_state();
        true
    }

    /// Close the assessment after the last question has been answered.
    pub fn finish(&mut self) -> Result<Classification, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Complete);
        }
        if !self.is_last() || !self.is_submitted() {
            return Err(SessionError::NotFinishable);
        }

        self.index = self.quizzes.len();
        self.matching = None;
        let classification = self.classify();
        tracing::info!(
            run_id = %self.run_id,
            band = %classification.band,
            correct = classification.correct,
            total = classification.total,
            "assessment complete"
        );
        self.classification = Some(classification.clone());
        Ok(classification)
    }
}

enum QuestionGrade {
    Matching,
    Empty,
    Graded(bool),
}

fn grade_question(quiz: &Quiz, submission: &AnswerSubmission) -> QuestionGrade {
    if quiz.is_matching() {
        return QuestionGrade::Matching;
    }
    match submission.effective_answer() {
        None => QuestionGrade::Empty,
        Some(answer) => QuestionGrade::Graded(quiz.grade(answer).unwrap_or(false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairs::MatchingMap;
    use crate::proficiency::ProficiencyBand;
    use crate::quiz::{NewQuiz, QuizBody};
    use crate::types::QuizType;
    use pretty_assertions::assert_eq;

    fn mcq(answer: &str) -> Quiz {
        NewQuiz {
            unit_id: 1,
            quiz_type: QuizType::Mcq,
            cefr: None,
            body: QuizBody::TextToText {
                question: format!("Pick {answer}"),
                choices: vec![answer.to_string(), "other".to_string()],
                answer: answer.to_string(),
            },
            explanation: None,
        }
        .into_quiz(0)
    }

    fn matching() -> Quiz {
        NewQuiz {
            unit_id: 1,
            quiz_type: QuizType::Matching,
            cefr: None,
            body: QuizBody::MatchTextText {
                question: "Match".to_string(),
                pairs: MatchingMap::from_pairs([("one", "uno"), ("two", "dos")]).unwrap(),
            },
            explanation: None,
        }
        .into_quiz(0)
    }

    fn ticket_of(outcome: SubmitOutcome) -> AdvanceTicket {
        match outcome {
            SubmitOutcome::Graded {
                advance: Advance::Scheduled(ticket),
                ..
            } => ticket,
            other => panic!("expected scheduled advance, got {other:?}"),
        }
    }

    #[test]
    fn three_correct_answers_then_finish() {
        let mut session = AssessmentSession::new(
            vec![mcq("a"), mcq("b"), mcq("c")],
            AssessmentSettings::default(),
        );

        for answer in ["a", "b"] {
            let ticket = ticket_of(session.submit(AnswerSubmission::choice(answer)).unwrap());
            assert_eq!(ticket.delay(), Duration::from_millis(1200));
            assert!(session.advance(ticket));
        }

        let outcome = session.submit(AnswerSubmission::text(" C ")).unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Graded {
                correct: true,
                advance: Advance::AwaitingFinish
            }
        );
        assert_eq!(session.state(), SessionState::InProgress { index: 2 });

        let classification = session.finish().unwrap();
        assert_eq!(session.state(), SessionState::Complete);
        assert_eq!(session.correct_count(), 3);
        assert_eq!(classification.band, ProficiencyBand::A1);
        assert_eq!(classification.total, 3);
        assert!(classification.reference_length_mismatch);
    }

    #[test]
    fn empty_submission_is_a_no_op() {
        let mut session = AssessmentSession::new(vec![mcq("a")], AssessmentSettings::default());
        assert_eq!(
            session.submit(AnswerSubmission::default()).unwrap(),
            SubmitOutcome::Ignored
        );
        assert!(!session.is_submitted());
        assert_eq!(session.correct_count(), 0);
    }

    #[test]
    fn wrong_answer_still_advances_without_score() {
        let mut session = AssessmentSession::new(vec![mcq("a"), mcq("b")], AssessmentSettings::default());
        let outcome = session.submit(AnswerSubmission::choice("other")).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Graded { correct: false, .. }));
        assert_eq!(session.correct_count(), 0);
        assert_eq!(session.last_result(), Some(false));
    }

    #[test]
    fn double_submit_is_rejected() {
        let mut session = AssessmentSession::new(vec![mcq("a"), mcq("b")], AssessmentSettings::default());
        session.submit(AnswerSubmission::choice("a")).unwrap();
        assert_eq!(
            session.submit(AnswerSubmission::choice("a")).unwrap_err(),
            SessionError::AlreadySubmitted { index: 0 }
        );
    }

    #[test]
    fn advance_clears_question_state() {
        let mut session = AssessmentSession::new(vec![mcq("a"), mcq("b")], AssessmentSettings::default());
        let ticket = ticket_of(session.submit(AnswerSubmission::choice("a")).unwrap());
        assert!(session.submission().is_some());

        assert!(session.advance(ticket));
        assert_eq!(session.index(), 1);
        assert!(session.submission().is_none());
        assert!(!session.is_submitted());
        assert!(session.pending_advance().is_none());
        assert!(!session.advance(ticket), "ticket is single use");
    }

    #[test]
    fn finish_requires_last_answered_question() {
        let mut session = AssessmentSession::new(vec![mcq("a"), mcq("b")], AssessmentSettings::default());
        assert_eq!(session.finish().unwrap_err(), SessionError::NotFinishable);

        let ticket = ticket_of(session.submit(AnswerSubmission::choice("a")).unwrap());
        assert_eq!(session.finish().unwrap_err(), SessionError::NotFinishable);
        session.advance(ticket);
        assert_eq!(session.finish().unwrap_err(), SessionError::NotFinishable);

        session.submit(AnswerSubmission::choice("b")).unwrap();
        session.finish().unwrap();
        assert_eq!(session.finish().unwrap_err(), SessionError::Complete);
        assert_eq!(
            session.submit(AnswerSubmission::choice("b")).unwrap_err(),
            SessionError::Complete
        );
    }

    #[test]
    fn reset_invalidates_pending_ticket() {
        let mut session = AssessmentSession::new(vec![mcq("a"), mcq("b")], AssessmentSettings::default());
        let ticket = ticket_of(session.submit(AnswerSubmission::choice("a")).unwrap());
        let old_run = session.run_id();

        session.reset(vec![mcq("x"), mcq("y"), mcq("z")]);

        assert_ne!(session.run_id(), old_run);
        assert!(!session.advance(ticket));
        assert_eq!(session.index(), 0);
        assert_eq!(session.correct_count(), 0);
        assert_eq!(session.total(), 3);
        assert!(!session.is_submitted());
    }

    #[test]
    fn matching_question_requires_resolution() {
        let mut session = AssessmentSession::new(vec![matching(), mcq("a")], AssessmentSettings::default());

        assert_eq!(
            session.submit(AnswerSubmission::default()).unwrap_err(),
            SessionError::MatchingUnresolved
        );

        session.pick(Side::Left, "one").unwrap();
        session.pick(Side::Right, "uno").unwrap();
        session.pick(Side::Left, "two").unwrap();
        session.pick(Side::Right, "dos").unwrap();
        assert!(session.matching().unwrap().is_resolved());

        let outcome = session.submit(AnswerSubmission::default()).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Graded { correct: true, .. }));
        assert_eq!(session.correct_count(), 1);

        let ticket = ticket_of(outcome);
        session.advance(ticket);
        assert!(session.matching().is_none());
        assert_eq!(
            session.pick(Side::Left, "one").unwrap_err(),
            SessionError::NotMatching { index: 1 }
        );
    }

    #[test]
    fn mismatch_feedback_clears_through_session() {
        let mut session = AssessmentSession::new(vec![matching()], AssessmentSettings::default());
        session.pick(Side::Left, "one").unwrap();
        let ticket = match session.pick(Side::Right, "dos").unwrap() {
            PickOutcome::Mismatched(ticket) => ticket,
            other => panic!("unexpected {other:?}"),
        };
        assert!(session.matching().unwrap().wrong_pair().is_some());
        assert!(session.clear_feedback(ticket));
        assert!(session.matching().unwrap().wrong_pair().is_none());
    }

    #[test]
    fn empty_list_is_complete_immediately() {
        let session = AssessmentSession::new(Vec::new(), AssessmentSettings::default());
        assert_eq!(session.state(), SessionState::Complete);
        assert_eq!(session.classification().map(|c| c.band), Some(ProficiencyBand::A1));
    }
}
