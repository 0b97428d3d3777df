//! clutch-window - Clutch-time segmentation engine for basketball play-by-play
//!
//! Turns a game's ordered play-by-play feed into the set of closed "clutch"
//! windows (late in the game, close score), scores each window's intensity,
//! and attributes every shot, free throw, rebound, turnover and foul to the
//! window it happened in:
//! vendor adaptation → normalization → segmentation → intensity scoring →
//! action attribution → per-player clutch lines → payload encoding.
//!
//! Every stage is a pure function of its inputs, so independent games can be
//! processed in parallel without coordination.
//!
//! ## Modules
//!
//! - **Adapters / Normalizer**: Stats API (`playbyplayv2`) and live data feeds into canonical events
//! - **Predicate / Segmenter / Intensity**: Clutch windows and their scores
//! - **Attribution / Clutch stats**: Actions tagged with their window, and player splits

pub mod adapters;
pub mod attribution;
pub mod clutch_stats;
pub mod config;
pub mod encoder;
pub mod error;
pub mod intensity;
pub mod normalizer;
pub mod pipeline;
pub mod predicate;
pub mod segmenter;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use attribution::{attribute, attribute_raw, classify, Attribution};
pub use config::EngineConfig;
pub use error::ComputeError;
pub use intensity::{IntensityScorer, IntensityWeights};
pub use pipeline::{analyze_feed, analyze_game, ClutchProcessor, GameReport};
pub use predicate::is_qualifying;
pub use segmenter::{segment_events, Segmenter};
pub use types::{Action, Criteria, Event, GameTime, Segment, StreamPosition, Vendor};

/// Engine version embedded in all payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for payloads
pub const PRODUCER_NAME: &str = "clutch-window";
