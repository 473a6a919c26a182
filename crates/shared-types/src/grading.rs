//! Weighted final-grade computation and classification.
//!
//! A grade sheet's final grade is the weighted average of its assignment
//! ratios, scaled to 0–10:
//!
//! ```text
//! weighted_sum = Σ (score / max_score) * weight
//! total_weight = Σ weight
//! final_grade  = (weighted_sum / total_weight) * 10
//! ```
//!
//! A sheet whose assignments carry no weight (including the empty sheet)
//! has no final grade.

use serde::{Deserialize, Serialize};

use crate::grade::Assignment;

/// Classification band for a final grade on the 0–10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum GradeBand {
    Excellent,
    Good,
    AboveAverage,
    Average,
    BelowAverage,
}

impl GradeBand {
    /// Bucket a final grade: ≥9.0 excellent, ≥8.0 good, ≥7.0 above
    /// average, ≥5.0 average, else below average.
    pub fn classify(final_grade: f64) -> Self {
        if final_grade >= 9.0 {
            GradeBand::Excellent
        } else if final_grade >= 8.0 {
            GradeBand::Good
        } else if final_grade >= 7.0 {
            GradeBand::AboveAverage
        } else if final_grade >= 5.0 {
            GradeBand::Average
        } else {
            GradeBand::BelowAverage
        }
    }

    /// Snake_case string matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeBand::Excellent => "excellent",
            GradeBand::Good => "good",
            GradeBand::AboveAverage => "above_average",
            GradeBand::Average => "average",
            GradeBand::BelowAverage => "below_average",
        }
    }
}

/// Per-band counts of graded sheets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GradeDistribution {
    pub excellent: i64,
    pub good: i64,
    pub above_average: i64,
    pub average: i64,
    pub below_average: i64,
}

impl GradeDistribution {
    /// Count one graded sheet in its band.
    pub fn record(&mut self, band: GradeBand) {
        match band {
            GradeBand::Excellent => self.excellent += 1,
            GradeBand::Good => self.good += 1,
            GradeBand::AboveAverage => self.above_average += 1,
            GradeBand::Average => self.average += 1,
            GradeBand::BelowAverage => self.below_average += 1,
        }
    }
}

/// Weighted final grade for an assignment list, on the 0–10 scale.
/// `None` when the total weight is zero. An assignment with a
/// non-positive max score contributes a zero ratio; its weight still
/// counts toward the total.
pub fn final_grade(assignments: &[Assignment]) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for a in assignments {
        let ratio = if a.max_score > 0.0 {
            a.score / a.max_score
        } else {
            0.0
        };
        weighted_sum += ratio * a.weight;
        total_weight += a.weight;
    }

    if total_weight > 0.0 {
        Some((weighted_sum / total_weight) * 10.0)
    } else {
        None
    }
}

/// Round half-up to 2 decimal places.
pub fn round_off_2_decimals(value: f64) -> f64 {
    ((100.0 * value) + 0.5).floor() / 100.0
}
