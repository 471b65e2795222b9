//! Answer normalization and comparison for choice-based quizzes.

use serde::{Deserialize, Serialize};

/// How a submitted answer is compared against the correct one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Trim and case-fold both sides, then compare byte-wise.
    Text,
    /// Opaque resource locators, compared verbatim.
    Locator,
}

/// An answer as entered by the learner: a picked choice and/or free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl AnswerSubmission {
    pub fn choice(value: impl Into<String>) -> Self {
        Self {
            selected: Some(value.into()),
            text: None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            selected: None,
            text: Some(value.into()),
        }
    }

    /// The answer to grade: the selected choice wins over free text.
    /// `None` when neither carries anything.
    pub fn effective_answer(&self) -> Option<&str> {
        if let Some(selected) = self.selected.as_deref().filter(|s| !s.is_empty()) {
            return Some(selected);
        }
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.effective_answer().is_none()
    }
}

/// Normalize text for comparison (trim and lowercase).
pub fn normalize_answer(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Compare a submitted answer to the correct answer.
pub fn answers_match(submitted: &str, correct: &str, comparison: Comparison) -> bool {
    match comparison {
        Comparison::Text => normalize_answer(submitted) == normalize_answer(correct),
        Comparison::Locator => submitted == correct,
    }
}
