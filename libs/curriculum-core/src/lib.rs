//! Core curriculum library shared by the service layer.
//!
//! Provides:
//! - Section / Unit / Story / Vocabulary / Quiz types
//! - Hierarchy integrity rules (deletion guards, unit cascades, display order)
//! - Quiz validation and answer grading per mode
//! - Pairwise matching engine
//! - Assessment session state machine and proficiency banding

pub mod error;
pub mod grading;
pub mod hierarchy;
pub mod matching;
pub mod pairs;
pub mod proficiency;
pub mod quiz;
pub mod session;
pub mod settings;
pub mod types;

pub use error::{IntegrityError, MatchingError, Result, SessionError, ValidationError};
pub use grading::{answers_match, normalize_answer, AnswerSubmission, Comparison};
pub use hierarchy::{ensure_section_deletable, sort_for_display, DisplayOrder, UnitCascade};
pub use matching::{FeedbackTicket, MatchingEngine, MatchingState, PickOutcome, Side, WrongPair};
pub use pairs::MatchingMap;
pub use proficiency::{BandThresholds, Classification, ProficiencyBand};
pub use quiz::{NewQuiz, Quiz, QuizBody};
pub use session::{Advance, AdvanceTicket, AssessmentSession, SessionState, SubmitOutcome};
pub use settings::AssessmentSettings;
pub use types::{
    CefrLevel, EntityKind, NewSection, NewStory, NewUnit, NewVocabularyItem, QuizMode, QuizType,
    Section, SectionPatch, Story, StoryLength, StoryPatch, StoryRequest, Unit, UnitPatch,
    VocabularyItem,
};
