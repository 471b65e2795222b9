pub mod assessment;
pub mod hierarchy;

pub use assessment::{AssessmentRunner, MatchingSnapshot, SessionSnapshot};
pub use hierarchy::ContentHierarchy;
