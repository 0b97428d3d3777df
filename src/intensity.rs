//! Segment intensity scoring
//!
//! Maps a closed segment's boundary state to a continuous 0-1 score:
//!
//! ```text
//! time   = 1 - min(clock_remaining_at_start / max_window_seconds, 1)
//! margin = 1 - min(|margin_at_close| / max_margin, 1)
//! score  = time_weight * time + margin_weight * margin
//! ```
//!
//! The result is clamped to 0-1 and rounded to two decimals so that repeated
//! runs compare exactly.

use crate::types::{Criteria, Segment};
use serde::{Deserialize, Serialize};

/// Relative weight of time pressure vs. closeness of the score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityWeights {
    #[serde(default = "default_time_weight")]
    pub time_weight: f64,
    #[serde(default = "default_margin_weight")]
    pub margin_weight: f64,
}

fn default_time_weight() -> f64 {
    0.7
}

fn default_margin_weight() -> f64 {
    0.3
}

impl Default for IntensityWeights {
    fn default() -> Self {
        Self {
            time_weight: default_time_weight(),
            margin_weight: default_margin_weight(),
        }
    }
}

/// Scorer bound to one set of criteria and weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityScorer {
    max_window_seconds: u32,
    max_margin: u32,
    weights: IntensityWeights,
}

impl IntensityScorer {
    pub fn new(criteria: &Criteria, weights: IntensityWeights) -> Self {
        Self {
            max_window_seconds: criteria.max_window_seconds,
            max_margin: criteria.max_margin,
            weights,
        }
    }

    /// Score from the clock at the segment's first event and the margin at close
    pub fn score(&self, clock_remaining_at_start: u32, margin_at_close: i32) -> f64 {
        let time_component =
            1.0 - bounded_ratio(clock_remaining_at_start, self.max_window_seconds);
        let margin_component =
            1.0 - bounded_ratio(margin_at_close.unsigned_abs(), self.max_margin);

        let raw = self.weights.time_weight * time_component
            + self.weights.margin_weight * margin_component;

        round2(raw.clamp(0.0, 1.0))
    }

    /// Score a closed segment
    pub fn score_segment(&self, segment: &Segment) -> f64 {
        self.score(
            segment.start.time.clock_remaining_seconds,
            segment.margin_at_close,
        )
    }
}

/// `min(value / max, 1)`; a zero bound only admits zero
fn bounded_ratio(value: u32, max: u32) -> f64 {
    if max == 0 {
        return if value == 0 { 0.0 } else { 1.0 };
    }
    (value as f64 / max as f64).min(1.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
