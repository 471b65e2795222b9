//! Assessment timing and scoring settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::proficiency::BandThresholds;

/// Settings for an assessment session and its matching questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentSettings {
    /// Delay before moving on after a graded, non-final question.
    pub advance_delay_ms: u64,
    /// How long a wrong matching pair stays flagged.
    pub feedback_delay_ms: u64,
    /// Question count the band thresholds were calibrated for.
    pub reference_length: usize,
    pub thresholds: BandThresholds,
}

impl Default for AssessmentSettings {
    fn default() -> Self {
        Self {
            advance_delay_ms: 1200,
            feedback_delay_ms: 1000,
            reference_length: 20,
            thresholds: BandThresholds::default(),
        }
    }
}

impl AssessmentSettings {
    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_delay_ms)
    }
}
