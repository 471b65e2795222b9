//! Proficiency banding from an assessment score.
//!
//! Thresholds are absolute correct-answer counts calibrated for a fixed-length
//! placement test. They are never rescaled for other list lengths; a
//! [`Classification`] instead reports when the list length differs from the
//! reference length.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Estimated proficiency band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProficiencyBand {
    A1,
    A2,
    B1,
    #[serde(rename = "B2+")]
    B2Plus,
}

impl ProficiencyBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2Plus => "B2+",
        }
    }
}

impl fmt::Display for ProficiencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exclusive upper bounds for each band, checked lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandThresholds {
    pub a1_below: u32,
    pub a2_below: u32,
    pub b1_below: u32,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            a1_below: 5,
            a2_below: 9,
            b1_below: 12,
        }
    }
}

impl BandThresholds {
    pub fn classify(&self, correct: u32) -> ProficiencyBand {
        if correct < self.a1_below {
            ProficiencyBand::A1
        } else if correct < self.a2_below {
            ProficiencyBand::A2
        } else if correct < self.b1_below {
            ProficiencyBand::B1
        } else {
            ProficiencyBand::B2Plus
        }
    }
}

/// Final result of an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub band: ProficiencyBand,
    pub correct: u32,
    pub total: usize,
    /// Set when `total` differs from the length the thresholds assume.
    pub reference_length_mismatch: bool,
    pub completed_at: DateTime<Utc>,
}

impl Classification {
    pub fn new(thresholds: &BandThresholds, correct: u32, total: usize, reference_length: usize) -> Self {
        let reference_length_mismatch = total != reference_length;
        if reference_length_mismatch {
            tracing::warn!(
                total,
                reference_length,
                "assessment length differs from the reference length; band thresholds are not rescaled"
            );
        }
        Self {
            band: thresholds.classify(correct),
            correct,
            total,
            reference_length_mismatch,
            completed_at: Utc::now(),
        }
    }
}
