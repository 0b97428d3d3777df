//! Pipeline orchestration
//!
//! This module provides the public API for the clutch-window engine.
//! It orchestrates the full pipeline from raw vendor JSON to an encoded report.

use crate::adapters::{adapter_for, VendorPayloadAdapter};
use crate::attribution::attribute_raw;
use crate::clutch_stats::{summarize, PlayerClutchLine};
use crate::config::EngineConfig;
use crate::encoder::ReportEncoder;
use crate::error::ComputeError;
use crate::segmenter::Segmenter;
use crate::types::{Action, ConsistencyWarning, GameFeed, Segment, Vendor};
use serde::{Deserialize, Serialize};

/// Everything the engine derives from one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    pub events_processed: usize,
    pub dropped_records: usize,
    pub segments: Vec<Segment>,
    pub actions: Vec<Action>,
    pub players: Vec<PlayerClutchLine>,
    pub warnings: Vec<ConsistencyWarning>,
}

impl GameReport {
    /// Actions attributed to the segment with `segment_id`
    pub fn actions_in(&self, segment_id: usize) -> impl Iterator<Item = &Action> {
        self.actions
            .iter()
            .filter(move |a| a.segment_ref == Some(segment_id))
    }
}

/// Run the engine over an already-normalized feed.
///
/// Pure and deterministic: the same feed and config always produce the same
/// report, so games can be processed on independent threads.
pub fn analyze_feed(feed: &GameFeed, config: &EngineConfig) -> GameReport {
    // Stage 1: Segment the event stream (scores each segment as it closes)
    let segmenter = Segmenter::new(config.criteria, config.intensity);
    let segments = segmenter.segment(&feed.events);

    // Stage 2: Classify plays and attribute them to segments
    let attribution = attribute_raw(&feed.actions, &segments);

    // Stage 3: Per-player clutch lines
    let players = summarize(&attribution.actions);

    log::info!(
        "game {}: {} events, {} segments, {} actions",
        feed.game_id.as_deref().unwrap_or("unknown"),
        feed.events.len(),
        segments.len(),
        attribution.actions.len()
    );

    GameReport {
        game_id: feed.game_id.clone(),
        events_processed: feed.events.len(),
        dropped_records: feed.dropped_records,
        segments,
        actions: attribution.actions,
        players,
        warnings: attribution.warnings,
    }
}

/// Parse a vendor payload and run the engine over it.
///
/// # Arguments
/// * `raw_json` - Raw play-by-play response JSON
/// * `vendor` - Which vendor shape `raw_json` follows
/// * `config` - Criteria and intensity weights
///
/// # Example
/// ```ignore
/// let report = analyze_game(&pbp_json, Vendor::NbaStats, &EngineConfig::default())?;
/// ```
pub fn analyze_game(
    raw_json: &str,
    vendor: Vendor,
    config: &EngineConfig,
) -> Result<GameReport, ComputeError> {
    config.validate()?;
    let adapter = adapter_for(vendor);
    analyze_with_adapter(adapter.as_ref(), raw_json, config)
}

fn analyze_with_adapter(
    adapter: &dyn VendorPayloadAdapter,
    raw_json: &str,
    config: &EngineConfig,
) -> Result<GameReport, ComputeError> {
    log::debug!("parsing {} payload", adapter.vendor().as_str());
    let feed = adapter.parse(raw_json)?;
    Ok(analyze_feed(&feed, config))
}

/// Processor holding a validated configuration and a report encoder.
///
/// Use this when many games are analyzed with the same settings.
pub struct ClutchProcessor {
    config: EngineConfig,
    encoder: ReportEncoder,
}

impl Default for ClutchProcessor {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            encoder: ReportEncoder::new(),
        }
    }
}

impl ClutchProcessor {
    /// Create a processor with a validated configuration
    pub fn new(config: EngineConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder: ReportEncoder::new(),
        })
    }

    /// Create a processor from a JSON configuration document
    pub fn from_config_json(json: &str) -> Result<Self, ComputeError> {
        Self::new(EngineConfig::from_json(json)?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze a vendor payload and return the report
    pub fn analyze(&self, raw_json: &str, vendor: Vendor) -> Result<GameReport, ComputeError> {
        let adapter = adapter_for(vendor);
        analyze_with_adapter(adapter.as_ref(), raw_json, &self.config)
    }

    /// Analyze a vendor payload and return the encoded JSON payload
    pub fn process(&self, raw_json: &str, vendor: Vendor) -> Result<String, ComputeError> {
        let report = self.analyze(raw_json, vendor)?;
        self.encoder.encode_to_json(&report, vendor, &self.config)
    }
}
