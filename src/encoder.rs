//! Report encoding
//!
//! Wraps a [`GameReport`] in a versioned JSON envelope carrying producer and
//! provenance metadata, the configuration it was computed with, and a short
//! summary block for consumers that only need the headline numbers.

use crate::config::EngineConfig;
use crate::error::ComputeError;
use crate::pipeline::GameReport;
use crate::types::{Segment, Vendor};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current payload schema version
pub const PAYLOAD_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClutchPayload {
    pub payload_version: String,
    pub producer: Producer,
    pub provenance: Provenance,
    pub config: EngineConfig,
    pub summary: ReportSummary,
    pub report: GameReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_vendor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    pub computed_at_utc: String,
}

/// Headline numbers derived from the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub segment_count: usize,
    /// Game-clock seconds covered by all segments
    pub clutch_seconds: u32,
    pub clutch_actions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_intensity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_segment: Option<usize>,
    pub flags: Vec<String>,
}

/// Encoder for producing report payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode a report into a payload
    pub fn encode(
        &self,
        report: &GameReport,
        vendor: Vendor,
        config: &EngineConfig,
    ) -> ClutchPayload {
        let producer = Producer {
            name: PRODUCER_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = Provenance {
            source_vendor: vendor.as_str().to_string(),
            game_id: report.game_id.clone(),
            computed_at_utc: Utc::now().to_rfc3339(),
        };

        ClutchPayload {
            payload_version: PAYLOAD_VERSION.to_string(),
            producer,
            provenance,
            config: *config,
            summary: summarize_report(report),
            report: report.clone(),
        }
    }

    /// Encode to pretty-printed JSON
    pub fn encode_to_json(
        &self,
        report: &GameReport,
        vendor: Vendor,
        config: &EngineConfig,
    ) -> Result<String, ComputeError> {
        let payload = self.encode(report, vendor, config);
        serde_json::to_string_pretty(&payload).map_err(ComputeError::JsonError)
    }
}

fn summarize_report(report: &GameReport) -> ReportSummary {
    let peak = report
        .segments
        .iter()
        .fold(None, |best: Option<&Segment>, s| match best {
            Some(b) if b.intensity >= s.intensity => Some(b),
            _ => Some(s),
        });

    let mut flags = Vec::new();
    if report.dropped_records > 0 {
        flags.push("dropped_records".to_string());
    }
    if !report.warnings.is_empty() {
        flags.push("consistency_warnings".to_string());
    }
    if report.segments.is_empty() {
        flags.push("no_clutch_time".to_string());
    }

    ReportSummary {
        segment_count: report.segments.len(),
        clutch_seconds: report.segments.iter().map(|s| s.duration_seconds()).sum(),
        clutch_actions: report
            .actions
            .iter()
            .filter(|a| a.segment_ref.is_some())
            .count(),
        peak_intensity: peak.map(|s| s.intensity),
        peak_segment: peak.map(|s| s.id),
        flags,
    }
}
