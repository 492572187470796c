//! FSI-style proficiency estimation.
//!
//! Maps the overall accuracy score onto the 0.0..=5.0 half-step proficiency
//! scale through a fixed ascending threshold table: the estimate is the level
//! of the highest threshold the score meets.

use serde::{Deserialize, Serialize};

use super::{AnalysisError, Result};

/// Minimum overall score required for each proficiency level, ascending.
const FSI_THRESHOLDS: [(f32, f32); 11] = [
    (0.00, 0.0),
    (0.30, 0.5),
    (0.45, 1.0),
    (0.55, 1.5),
    (0.65, 2.0),
    (0.73, 2.5),
    (0.80, 3.0),
    (0.85, 3.5),
    (0.90, 4.0),
    (0.95, 4.5),
    (0.98, 5.0),
];

/// A proficiency level: a half-step value in 0.0..=5.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProficiencyLevel(f32);

impl ProficiencyLevel {
    pub fn new(value: f32) -> Result<Self> {
        let valid = value.is_finite()
            && (0.0..=5.0).contains(&value)
            && (value * 2.0).fract() == 0.0;
        if valid {
            Ok(Self(value))
        } else {
            Err(AnalysisError::OutOfRange {
                field: "proficiency_level",
                value,
            })
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

/// Estimates the level earned by an overall accuracy score. Scores outside
/// [0, 1] are clamped first, so the lowest threshold always applies.
pub fn estimate(overall_score: f32) -> ProficiencyLevel {
    let score = if overall_score.is_nan() {
        0.0
    } else {
        overall_score.clamp(0.0, 1.0)
    };
    let mut level = FSI_THRESHOLDS[0].1;
    for &(threshold, candidate) in &FSI_THRESHOLDS {
        if score >= threshold {
            level = candidate;
        } else {
            break;
        }
    }
    ProficiencyLevel(level)
}
