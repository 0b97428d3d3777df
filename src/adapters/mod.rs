//! Vendor play-by-play adapters
//!
//! This module provides adapters that parse raw vendor JSON payloads and map them
//! to a vendor-agnostic [`GameFeed`]. Malformed records are dropped and counted
//! here; they never reach the segmentation core.

mod nba_live;
mod nba_stats;

pub use nba_live::NbaLiveAdapter;
pub use nba_stats::NbaStatsAdapter;

use crate::error::ComputeError;
use crate::types::{GameFeed, Vendor};

/// Trait for vendor payload adapters
pub trait VendorPayloadAdapter {
    /// Vendor this adapter understands
    fn vendor(&self) -> Vendor;

    /// Parse raw JSON into an ordered game feed
    fn parse(&self, raw_json: &str) -> Result<GameFeed, ComputeError>;
}

/// Adapter for the given vendor
pub fn adapter_for(vendor: Vendor) -> Box<dyn VendorPayloadAdapter> {
    match vendor {
        Vendor::NbaStats => Box::new(NbaStatsAdapter),
        Vendor::NbaLive => Box::new(NbaLiveAdapter),
    }
}
