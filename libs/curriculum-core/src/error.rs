//! Error types for curriculum-core.

use thiserror::Error;

use crate::types::{EntityKind, QuizMode, QuizType};

/// Result type alias using ValidationError.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// A quiz payload or matching map that is not well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("quiz has no choices")]
    NoChoices,

    #[error("answer {answer:?} is not among the choices")]
    AnswerNotInChoices { answer: String },

    #[error("matching map is empty")]
    EmptyMatchingMap,

    #[error("duplicate matching key {0:?}")]
    DuplicateKey(String),

    #[error("duplicate matching value {0:?}")]
    DuplicateValue(String),

    #[error("blank term in matching map")]
    BlankTerm,

    #[error("quiz type {quiz_type} cannot use mode {mode}")]
    ModeMismatch { quiz_type: QuizType, mode: QuizMode },

    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("malformed matching map: {0}")]
    MalformedMatchingMap(String),
}

/// Structural violations of the content hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("section {section_id} still has {unit_count} linked unit(s); remove or reassign them first")]
    SectionHasUnits { section_id: i64, unit_count: usize },

    #[error("{kind} {id} does not exist")]
    MissingParent { kind: EntityKind, id: i64 },

    #[error("story {story_id} belongs to unit {owner_id}, not unit {unit_id}")]
    StoryOwnedElsewhere {
        story_id: i64,
        owner_id: i64,
        unit_id: i64,
    },

    #[error("{kind} {id} still has {count} linked {child}(s)")]
    HasChildren {
        kind: EntityKind,
        id: i64,
        child: EntityKind,
        count: usize,
    },
}

/// Errors raised by a matching engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchingError {
    #[error("{value:?} is not in the remaining {side} pool")]
    UnknownTerm { side: crate::matching::Side, value: String },
}

/// Errors raised by an assessment session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("assessment is already complete")]
    Complete,

    #[error("question {index} was already submitted")]
    AlreadySubmitted { index: usize },

    #[error("matching question is not resolved yet")]
    MatchingUnresolved,

    #[error("question {index} is not a matching question")]
    NotMatching { index: usize },

    #[error("finish is only available after answering the last question")]
    NotFinishable,

    #[error(transparent)]
    Matching(#[from] MatchingError),
}
