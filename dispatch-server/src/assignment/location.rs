//! Partner location lookups
//!
//! Locations come from partner heartbeats and live only in memory; they feed
//! matching and are never persisted to the ledger.

use async_trait::async_trait;
use dashmap::DashMap;
use shared::order::GeoPoint;
use shared::partner::LocationFix;
use std::sync::Arc;
use std::time::Duration;

/// Source of last known partner positions
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn last_location(&self, partner_id: &str) -> Option<LocationFix>;
}

/// In-memory table fed by heartbeats
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    fixes: Arc<DashMap<String, LocationFix>>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a position; an older fix than the stored one is ignored
    pub fn record(&self, partner_id: &str, point: GeoPoint, recorded_at: i64) -> LocationFix {
        let fix = LocationFix { point, recorded_at };
        let mut entry = self.fixes.entry(partner_id.to_string()).or_insert(fix);
        if entry.recorded_at < recorded_at {
            *entry = fix;
        }
        *entry
    }

    pub fn get(&self, partner_id: &str) -> Option<LocationFix> {
        self.fixes.get(partner_id).map(|fix| *fix)
    }

    pub fn remove(&self, partner_id: &str) -> Option<LocationFix> {
        self.fixes.remove(partner_id).map(|(_, fix)| fix)
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

#[async_trait]
impl LocationProvider for LocationTable {
    async fn last_location(&self, partner_id: &str) -> Option<LocationFix> {
        self.get(partner_id)
    }
}

/// Look up a location within `timeout`; a slow provider counts as unknown
pub async fn lookup_with_timeout(
    provider: &dyn LocationProvider,
    partner_id: &str,
    timeout: Duration,
) -> Option<LocationFix> {
    match tokio::time::timeout(timeout, provider.last_location(partner_id)).await {
        Ok(fix) => fix,
        Err(_) => {
            tracing::warn!(
                partner_id = %partner_id,
                timeout_ms = timeout.as_millis() as u64,
                "Location lookup timed out, skipping candidate"
            );
            None
        }
    }
}
