//! Clutch predicate
//!
//! Decides, for a single instant, whether the game is inside a qualifying
//! window. Both bounds are inclusive: "last 5:00" and "within 5".

use crate::types::{Criteria, Event};

/// Returns true when `event` satisfies every threshold in `criteria`.
pub fn is_qualifying(event: &Event, criteria: &Criteria) -> bool {
    event.period >= criteria.min_period
        && event.clock_remaining_seconds <= criteria.max_window_seconds
        && event.score_margin.unsigned_abs() <= criteria.max_margin
}
