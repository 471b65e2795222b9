//! External content generator interface.
//!
//! Quizzes and stories may be drafted by an outside service. The service layer
//! treats every draft as untrusted: quizzes are validated and re-homed under
//! the requesting unit before anything is stored.

use async_trait::async_trait;
use curriculum_core::{Quiz, QuizType, StoryRequest, Unit};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Story draft returned by a generator, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedStory {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub keywords: IndexSet<String>,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Draft one quiz of `quiz_type` for `unit`.
    async fn generate_quiz(&self, unit: &Unit, quiz_type: QuizType) -> anyhow::Result<Quiz>;

    /// Draft a reading passage for `unit`.
    async fn generate_story(&self, unit: &Unit, request: &StoryRequest) -> anyhow::Result<GeneratedStory>;

    /// Placement test items, in the order they are asked.
    async fn generate_quiz_list(&self) -> anyhow::Result<Vec<Quiz>>;
}
