//! Partner value types

use crate::order::GeoPoint;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Bicycle,
    Scooter,
    Motorcycle,
    Car,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vehicle {
    pub kind: VehicleType,
    pub number: String,
}

/// Rolling earnings windows in the partner's local calendar
///
/// Derived from `DeliveryCredited` events; the bucket keys record which
/// local day, ISO week and month the amounts belong to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EarningsWindows {
    pub today: Decimal,
    pub weekly: Decimal,
    pub monthly: Decimal,
    #[serde(default)]
    pub today_deliveries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<NaiveDate>,
    /// Monday of the current ISO week
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start: Option<NaiveDate>,
    /// First day of the current month
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_start: Option<NaiveDate>,
}

/// Last known partner position from a heartbeat (never persisted)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LocationFix {
    pub point: GeoPoint,
    pub recorded_at: i64,
}

/// Partner projection joined with the transient location table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartnerView {
    #[serde(flatten)]
    pub partner: super::PartnerSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_location: Option<LocationFix>,
}
