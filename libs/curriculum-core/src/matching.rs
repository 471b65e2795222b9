//! Pairwise matching: the state machine behind one MATCH_TEXT_TEXT quiz.
//!
//! The learner picks one term on the left and one on the right. A correct
//! pair leaves both pools; a wrong pair raises a short-lived feedback flag
//! and leaves the pools alone. The engine resolves once both pools are empty.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::MatchingError;
use crate::pairs::MatchingMap;

/// Which column a pick comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingState {
    Active,
    Resolved,
}

/// Identifies one wrong-pair feedback cycle. Only the most recent ticket can
/// clear the flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedbackTicket(u64);

/// A mismatched pair currently being flagged to the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrongPair {
    pub left: String,
    pub right: String,
    pub ticket: FeedbackTicket,
}

/// Result of one pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// Recorded; waiting for the other side.
    Pending,
    Matched { left: String, right: String },
    /// Wrong pair. Call [`MatchingEngine::clear_feedback`] with the ticket once
    /// the feedback delay has elapsed.
    Mismatched(FeedbackTicket),
    /// The engine is already resolved.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct MatchingEngine {
    pairs: MatchingMap,
    left_pool: Vec<String>,
    right_pool: Vec<String>,
    matched: Vec<(String, String)>,
    pending_left: Option<String>,
    pending_right: Option<String>,
    wrong: Option<WrongPair>,
    next_ticket: u64,
}

impl MatchingEngine {
    /// Start an engine with the right pool shuffled by the thread RNG.
    pub fn new(pairs: MatchingMap) -> Self {
        Self::with_rng(pairs, &mut rand::thread_rng())
    }

    /// Start an engine with a caller-supplied RNG (Fisher-Yates shuffle).
    pub fn with_rng<R: Rng + ?Sized>(pairs: MatchingMap, rng: &mut R) -> Self {
        let left_pool: Vec<String> = pairs.keys().map(str::to_string).collect();
        let mut right_pool: Vec<String> = pairs.values().map(str::to_string).collect();
        right_pool.shuffle(rng);

        Self {
            pairs,
            left_pool,
            right_pool,
            matched: Vec::new(),
            pending_left: None,
            pending_right: None,
            wrong: None,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> MatchingState {
        if self.left_pool.is_empty() && self.right_pool.is_empty() {
            MatchingState::Resolved
        } else {
            MatchingState::Active
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.state() == MatchingState::Resolved
    }

    /// Remaining left terms, in map order.
    pub fn left_pool(&self) -> &[String] {
        &self.left_pool
    }

    /// Remaining right terms, in shuffled order.
    pub fn right_pool(&self) -> &[String] {
        &self.right_pool
    }

    /// Matched pairs in the order they were found.
    pub fn matched(&self) -> &[(String, String)] {
        &self.matched
    }

    pub fn pending(&self, side: Side) -> Option<&str> {
        match side {
            Side::Left => self.pending_left.as_deref(),
            Side::Right => self.pending_right.as_deref(),
        }
    }

    pub fn wrong_pair(&self) -> Option<&WrongPair> {
        self.wrong.as_ref()
    }

    pub fn pairs(&self) -> &MatchingMap {
        &self.pairs
    }

    /// Pick a term. A pick replaces any pending pick on the same side; once
    /// both sides hold a pick they are resolved against the map.
    pub fn pick(&mut self, side: Side, value: &str) -> Result<PickOutcome, MatchingError> {
        if self.is_resolved() {
            return Ok(PickOutcome::Ignored);
        }

        let pool = match side {
            Side::Left => &self.left_pool,
            Side::Right => &self.right_pool,
        };
        if !pool.iter().any(|term| term == value) {
            return Err(MatchingError::UnknownTerm {
                side,
                value: value.to_string(),
            });
        }

        match side {
            Side::Left => self.pending_left = Some(value.to_string()),
            Side::Right => self.pending_right = Some(value.to_string()),
        }

        let (left, right) = match (self.pending_left.take(), self.pending_right.take()) {
            (Some(left), Some(right)) => (left, right),
            (left, right) => {
                self.pending_left = left;
                self.pending_right = right;
                return Ok(PickOutcome::Pending);
            }
        };

        if self.pairs.is_pair(&left, &right) {
            self.left_pool.retain(|term| term != &left);
            self.right_pool.retain(|term| term != &right);
            self.matched.push((left.clone(), right.clone()));
            tracing::debug!(%left, %right, remaining = self.left_pool.len(), "pair matched");
            Ok(PickOutcome::Matched { left, right })
        } else {
            self.next_ticket += 1;
            let ticket = FeedbackTicket(self.next_ticket);
            tracing::debug!(%left, %right, "pair mismatched");
            self.wrong = Some(WrongPair { left, right, ticket });
            Ok(PickOutcome::Mismatched(ticket))
        }
    }

    /// Clear the wrong-pair flag raised with `ticket`. Returns false when a
    /// newer mismatch has replaced it or it was already cleared.
    pub fn clear_feedback(&mut self, ticket: FeedbackTicket) -> bool {
        match &self.wrong {
            Some(wrong) if wrong.ticket == ticket => {
                self.wrong = None;
                true
            }
            _ => false,
        }
    }
}
