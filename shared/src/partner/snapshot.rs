//! Partner snapshot - current state projected from the partner event stream

use super::types::{EarningsWindows, Vehicle, VehicleType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Partner availability
///
/// `Busy` holds exactly when the partner has an active order; it is set and
/// cleared only by assignment, delivery, cancellation and reassignment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PartnerStatus {
    Online,
    #[default]
    Offline,
    Busy,
}

impl std::fmt::Display for PartnerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PartnerStatus::Online => "online",
            PartnerStatus::Offline => "offline",
            PartnerStatus::Busy => "busy",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartnerSnapshot {
    pub partner_id: String,
    pub name: String,
    pub phone: String,
    pub vehicle: Vehicle,
    pub status: PartnerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_order_id: Option<String>,
    /// Cumulative, never decreases
    pub total_deliveries: u64,
    /// Cumulative, never decreases
    pub total_earnings: Decimal,
    #[serde(default)]
    pub earnings: EarningsWindows,
    /// Weighted running average over `rating_count` ratings
    pub rating: f64,
    pub rating_count: u32,
    /// IANA timezone used to bucket earnings
    pub timezone: String,
    pub joined_at: i64,
    pub updated_at: i64,
    pub last_sequence: u64,
    #[serde(default)]
    pub state_checksum: String,
}

impl PartnerSnapshot {
    /// Create an empty projection; `PartnerRegistered` fills it in
    pub fn new(partner_id: String) -> Self {
        let mut snapshot = Self {
            partner_id,
            name: String::new(),
            phone: String::new(),
            vehicle: Vehicle {
                kind: VehicleType::Bicycle,
                number: String::new(),
            },
            status: PartnerStatus::Offline,
            active_order_id: None,
            total_deliveries: 0,
            total_earnings: Decimal::ZERO,
            earnings: EarningsWindows::default(),
            rating: 0.0,
            rating_count: 0,
            timezone: String::new(),
            joined_at: 0,
            updated_at: 0,
            last_sequence: 0,
            state_checksum: String::new(),
        };
        snapshot.update_checksum();
        snapshot
    }

    pub fn is_available(&self) -> bool {
        self.status == PartnerStatus::Online && self.active_order_id.is_none()
    }

    pub fn compute_checksum(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher as _;

        let mut hasher = DefaultHasher::new();
        self.status.hash(&mut hasher);
        self.active_order_id.hash(&mut hasher);
        self.total_deliveries.hash(&mut hasher);
        self.total_earnings.normalize().to_string().hash(&mut hasher);
        self.rating_count.hash(&mut hasher);
        self.last_sequence.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    pub fn update_checksum(&mut self) {
        self.state_checksum = self.compute_checksum();
    }

    pub fn verify_checksum(&self) -> bool {
        self.state_checksum == self.compute_checksum()
    }
}
