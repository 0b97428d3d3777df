//! Play-by-play normalization
//!
//! This module turns vendor strings into the engine's well-formed types.
//! - Game clocks (`"4:30"`, `"0:45.2"`, `"PT04M30.00S"`) to whole seconds remaining
//! - Score margins (`"TIE"`, `"+3"`, `"-2"`, absent) to signed integers
//! - Records into an ordered [`GameFeed`]
//!
//! Anything that cannot be parsed is rejected here so the segmentation core
//! never sees a partially populated event.

use crate::error::ComputeError;
use crate::types::{Event, GameFeed, RawAction};

/// Highest period number accepted (four quarters plus generous overtime)
pub const MAX_PERIOD: u8 = 20;

/// Parse a game clock into whole seconds remaining. Fractions are truncated.
pub fn parse_clock(raw: &str) -> Result<u32, ComputeError> {
    let trimmed = raw.trim();
    let invalid = || ComputeError::InvalidClock(raw.to_string());

    if trimmed.is_empty() {
        return Err(invalid());
    }

    if let Some(duration) = trimmed.strip_prefix("PT") {
        return parse_iso_clock(duration).ok_or_else(invalid);
    }

    match trimmed.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes = parse_whole(minutes).ok_or_else(invalid)?;
            let seconds = parse_seconds(seconds).ok_or_else(invalid)?;
            if seconds >= 60 {
                return Err(invalid());
            }
            minutes
                .checked_mul(60)
                .and_then(|m| m.checked_add(seconds))
                .ok_or_else(invalid)
        }
        None => parse_seconds(trimmed).ok_or_else(invalid),
    }
}

/// `04M30.00S`, `30.5S`, or `05M`
fn parse_iso_clock(duration: &str) -> Option<u32> {
    let (minutes, rest) = match duration.split_once('M') {
        Some((minutes, rest)) => (parse_whole(minutes)?, rest),
        None => (0, duration),
    };

    let seconds = if rest.is_empty() && duration.contains('M') {
        0
    } else {
        let seconds = parse_seconds(rest.strip_suffix('S')?)?;
        if duration.contains('M') && seconds >= 60 {
            return None;
        }
        seconds
    };

    minutes.checked_mul(60)?.checked_add(seconds)
}

fn parse_whole(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn parse_seconds(raw: &str) -> Option<u32> {
    match raw.split_once('.') {
        Some((whole, fraction)) => {
            if !fraction.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            parse_whole(whole)
        }
        None => parse_whole(raw),
    }
}

/// Parse a score margin. Absent or blank means "unchanged" and yields `None`.
pub fn parse_margin(raw: Option<&str>) -> Result<Option<i32>, ComputeError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.eq_ignore_ascii_case("TIE") {
        return Ok(Some(0));
    }

    let invalid = || ComputeError::InvalidScore(raw.to_string());
    let unsigned = match trimmed.strip_prefix('+') {
        Some(rest) if rest.starts_with(['+', '-']) => return Err(invalid()),
        Some(rest) => rest,
        None => trimmed,
    };
    unsigned
        .parse::<i32>()
        .map(Some)
        .map_err(|_| invalid())
}

/// Parse a team score string such as `"102"`.
pub fn parse_score(raw: &str) -> Result<u32, ComputeError> {
    parse_whole(raw.trim()).ok_or_else(|| ComputeError::InvalidScore(raw.to_string()))
}

/// Validate a vendor period number.
pub fn parse_period(value: i64) -> Result<u8, ComputeError> {
    match u8::try_from(value) {
        Ok(period) if (1..=MAX_PERIOD).contains(&period) => Ok(period),
        _ => Err(ComputeError::InvalidPeriod(value.to_string())),
    }
}

/// Accumulates normalized records for one game
#[derive(Debug, Default)]
pub struct FeedBuilder {
    game_id: Option<String>,
    events: Vec<Event>,
    actions: Vec<RawAction>,
    dropped: usize,
    margin: i32,
}

impl FeedBuilder {
    pub fn new(game_id: Option<String>) -> Self {
        Self {
            game_id,
            ..Default::default()
        }
    }

    /// Fold a possibly-absent margin into the running margin (starts tied).
    pub fn observe_margin(&mut self, margin: Option<i32>) -> i32 {
        if let Some(margin) = margin {
            self.margin = margin;
        }
        self.margin
    }

    pub fn set_game_id(&mut self, game_id: String) {
        if self.game_id.is_none() {
            self.game_id = Some(game_id);
        }
    }

    pub fn push(&mut self, event: Event, action: RawAction) {
        self.events.push(event);
        self.actions.push(action);
    }

    pub fn reject(&mut self, position: usize, error: &ComputeError) {
        log::debug!("dropping record {position}: {error}");
        self.dropped += 1;
    }

    /// Finish the feed, restoring game-time order if the vendor delivered
    /// records out of sequence. The sort is stable, so same-instant records
    /// keep their vendor order. Each action is stamped with the index of its
    /// event so attribution can tell same-instant plays apart.
    pub fn finish(self) -> GameFeed {
        let mut records: Vec<(Event, RawAction)> =
            self.events.into_iter().zip(self.actions).collect();

        if !records
            .windows(2)
            .all(|w| w[0].0.timestamp() <= w[1].0.timestamp())
        {
            log::warn!(
                "play-by-play for {} arrived out of order; re-sequencing",
                self.game_id.as_deref().unwrap_or("unknown game")
            );
            records.sort_by_key(|(event, _)| event.timestamp());
        }

        let (events, actions): (Vec<Event>, Vec<RawAction>) = records
            .into_iter()
            .enumerate()
            .map(|(sequence, (event, mut action))| {
                action.sequence = Some(sequence);
                (event, action)
            })
            .unzip();

        GameFeed {
            game_id: self.game_id,
            events,
            actions,
            dropped_records: self.dropped,
        }
    }
}
