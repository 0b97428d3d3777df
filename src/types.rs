//! Core types for the clutch-window engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: normalized events, raw actions, closed segments, and attributed actions.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Number of regulation periods in a game; later periods are overtime
pub const REGULATION_PERIODS: u8 = 4;

/// Vendor identifier for provenance tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    /// Stats API `playbyplayv2` result sets
    NbaStats,
    /// Live data `game.actions` feed
    NbaLive,
}

impl Vendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::NbaStats => "nba_stats",
            Vendor::NbaLive => "nba_live",
        }
    }
}

impl FromStr for Vendor {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "nba_stats" | "stats" => Ok(Vendor::NbaStats),
            "nba_live" | "live" => Ok(Vendor::NbaLive),
            other => Err(ComputeError::UnsupportedVendor(other.to_string())),
        }
    }
}

/// A point in game time.
///
/// Ordered by period ascending, then by clock remaining descending, so that
/// `Q4 0:00 < OT1 5:00` even though both sit on the same wall-clock instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameTime {
    /// Period number (1-based; 5+ is overtime)
    pub period: u8,
    /// Seconds left on the game clock in `period`
    pub clock_remaining_seconds: u32,
}

impl GameTime {
    pub fn new(period: u8, clock_remaining_seconds: u32) -> Self {
        Self {
            period,
            clock_remaining_seconds,
        }
    }

    pub fn is_overtime(&self) -> bool {
        self.period > REGULATION_PERIODS
    }
}

impl Ord for GameTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.period
            .cmp(&other.period)
            .then_with(|| other.clock_remaining_seconds.cmp(&self.clock_remaining_seconds))
    }
}

impl PartialOrd for GameTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.clock_remaining_seconds / 60;
        let seconds = self.clock_remaining_seconds % 60;
        if self.is_overtime() {
            write!(
                f,
                "OT{} {}:{:02}",
                self.period - REGULATION_PERIODS,
                minutes,
                seconds
            )
        } else {
            write!(f, "Q{} {}:{:02}", self.period, minutes, seconds)
        }
    }
}

/// An event's place in the ordered stream.
///
/// Several events can share one [`GameTime`] (a basket and its and-one, a
/// substitution wave), so the event's index in the stream breaks ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamPosition {
    #[serde(flatten)]
    pub time: GameTime,
    /// Index of the event in the game's ordered event stream
    pub sequence: usize,
}

impl StreamPosition {
    pub fn new(time: GameTime, sequence: usize) -> Self {
        Self { time, sequence }
    }
}

impl fmt::Display for StreamPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.time, self.sequence)
    }
}

/// Player or team responsible for an event
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Actor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Team tricode (e.g. "BOS")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

impl Actor {
    /// Stable grouping key: player id when known, else name, else team.
    pub fn key(&self) -> Option<String> {
        if let Some(id) = self.player_id {
            return Some(format!("player:{id}"));
        }
        if let Some(name) = &self.name {
            return Some(format!("name:{name}"));
        }
        self.team.as_ref().map(|team| format!("team:{team}"))
    }

    pub fn is_player(&self) -> bool {
        self.player_id.is_some() || self.name.is_some()
    }
}

/// One instant in a game's event stream.
///
/// Constructed by the normalizer; `period` is always >= 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub period: u8,
    pub clock_remaining_seconds: u32,
    /// Home minus away; 0 = tied
    pub score_margin: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<Actor>,
    /// Vendor event number, kept for traceability only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<u64>,
}

impl Event {
    pub fn new(period: u8, clock_remaining_seconds: u32, score_margin: i32) -> Self {
        Self {
            period,
            clock_remaining_seconds,
            score_margin,
            actor: None,
            source_id: None,
        }
    }

    pub fn timestamp(&self) -> GameTime {
        GameTime::new(self.period, self.clock_remaining_seconds)
    }
}

/// Thresholds deciding whether an instant is "clutch"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    /// First period that can qualify (4 = fourth quarter)
    #[serde(default = "default_min_period")]
    pub min_period: u8,
    /// Inclusive upper bound on clock remaining
    #[serde(default = "default_max_window_seconds")]
    pub max_window_seconds: u32,
    /// Inclusive upper bound on absolute score margin
    #[serde(default = "default_max_margin")]
    pub max_margin: u32,
}

fn default_min_period() -> u8 {
    4
}

fn default_max_window_seconds() -> u32 {
    300
}

fn default_max_margin() -> u32 {
    5
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            min_period: default_min_period(),
            max_window_seconds: default_max_window_seconds(),
            max_margin: default_max_margin(),
        }
    }
}

/// A closed, scored run of qualifying events.
///
/// Segments are only ever constructed by the segmenter once the window has
/// closed, so `intensity` is always final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Position in the segmenter's output
    pub id: usize,
    pub period: u8,
    /// First qualifying event (inclusive)
    pub start: StreamPosition,
    /// Last qualifying event (inclusive)
    pub end: StreamPosition,
    pub margin_at_open: i32,
    pub margin_at_close: i32,
    pub score_margin_absolute: u32,
    pub event_count: usize,
    /// 0.0 - 1.0
    pub intensity: f64,
}

impl Segment {
    pub fn contains(&self, position: StreamPosition) -> bool {
        self.start <= position && position <= self.end
    }

    /// Game-time containment for records that carry no stream position
    pub fn spans(&self, time: GameTime) -> bool {
        self.start.time <= time && time <= self.end.time
    }

    /// Game-clock seconds between the first and last qualifying event
    pub fn duration_seconds(&self) -> u32 {
        self.start
            .time
            .clock_remaining_seconds
            .saturating_sub(self.end.time.clock_remaining_seconds)
    }
}

/// Canonical play classification, keyed by the stats API message codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventMessageType {
    FieldGoalMade,
    FieldGoalMissed,
    FreeThrow,
    Rebound,
    Turnover,
    Foul,
    Violation,
    Substitution,
    Timeout,
    JumpBall,
    Ejection,
    PeriodStart,
    PeriodEnd,
    Unknown(u16),
}

impl EventMessageType {
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => EventMessageType::FieldGoalMade,
            2 => EventMessageType::FieldGoalMissed,
            3 => EventMessageType::FreeThrow,
            4 => EventMessageType::Rebound,
            5 => EventMessageType::Turnover,
            6 => EventMessageType::Foul,
            7 => EventMessageType::Violation,
            8 => EventMessageType::Substitution,
            9 => EventMessageType::Timeout,
            10 => EventMessageType::JumpBall,
            11 => EventMessageType::Ejection,
            12 => EventMessageType::PeriodStart,
            13 => EventMessageType::PeriodEnd,
            other => EventMessageType::Unknown(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            EventMessageType::FieldGoalMade => 1,
            EventMessageType::FieldGoalMissed => 2,
            EventMessageType::FreeThrow => 3,
            EventMessageType::Rebound => 4,
            EventMessageType::Turnover => 5,
            EventMessageType::Foul => 6,
            EventMessageType::Violation => 7,
            EventMessageType::Substitution => 8,
            EventMessageType::Timeout => 9,
            EventMessageType::JumpBall => 10,
            EventMessageType::Ejection => 11,
            EventMessageType::PeriodStart => 12,
            EventMessageType::PeriodEnd => 13,
            EventMessageType::Unknown(code) => *code,
        }
    }
}

/// An unclassified play as produced by a vendor adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAction {
    pub time: GameTime,
    pub message_type: EventMessageType,
    /// Stats API action sub-code (`EVENTMSGACTIONTYPE`); live feeds are mapped onto it
    pub action_code: u16,
    /// 2 or 3 for field goals when the vendor says so
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shot_value: Option<u8>,
    /// Explicit result for free throws
    #[serde(skip_serializing_if = "Option::is_none")]
    pub made: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<Actor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<u64>,
    /// Index of the paired event in [`GameFeed::events`], assigned by the normalizer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<usize>,
}

impl RawAction {
    pub fn new(time: GameTime, message_type: EventMessageType) -> Self {
        Self {
            time,
            message_type,
            action_code: 0,
            shot_value: None,
            made: None,
            actor: None,
            source_id: None,
            sequence: None,
        }
    }
}

/// Attributable action category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Shot,
    FreeThrow,
    Rebound,
    Turnover,
    Foul,
}

/// Refinement of an [`ActionType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSubtype {
    // Shots
    TwoPointer,
    ThreePointer,
    // Free throws
    Regular,
    Technical,
    Flagrant,
    // Rebounds
    Player,
    Team,
    // Turnovers
    BadPass,
    LostBall,
    Traveling,
    ShotClock,
    OffensiveFoul,
    // Fouls
    Personal,
    Shooting,
    LooseBall,
    Offensive,
    Other,
}

/// A classified action, optionally attributed to a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub time: GameTime,
    pub action_type: ActionType,
    pub action_subtype: ActionSubtype,
    pub is_successful: bool,
    pub points_scored: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<Actor>,
    /// `Segment::id` of the enclosing segment
    pub segment_ref: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<usize>,
}

impl Action {
    /// Stream position when the normalizer paired this play with an event
    pub fn position(&self) -> Option<StreamPosition> {
        self.sequence
            .map(|sequence| StreamPosition::new(self.time, sequence))
    }
}

/// Non-fatal inconsistency detected while attributing actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyWarning {
    /// Two segments share at least one instant
    OverlappingSegments { first: usize, second: usize },
    /// An action fell inside more than one segment; the earliest was chosen
    AmbiguousAttribution {
        action_index: usize,
        time: GameTime,
        segment_ids: Vec<usize>,
        chosen: usize,
    },
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyWarning::OverlappingSegments { first, second } => {
                write!(f, "segments {first} and {second} overlap")
            }
            ConsistencyWarning::AmbiguousAttribution {
                action_index,
                time,
                segment_ids,
                chosen,
            } => write!(
                f,
                "action {action_index} at {time} matches segments {segment_ids:?}; using {chosen}"
            ),
        }
    }
}

/// Normalized contents of one game's play-by-play payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameFeed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    pub events: Vec<Event>,
    pub actions: Vec<RawAction>,
    /// Vendor records rejected during normalization
    pub dropped_records: usize,
}
