//! Assignment Engine
//!
//! Matches confirmed orders to delivery partners:
//!
//! - **geo**: haversine distance
//! - **ranking**: candidate order (distance, rating, load, seniority)
//! - **location**: last known partner positions with bounded lookups
//! - **offers**: open offers and the accept/timeout race
//! - **engine**: matching rounds and the worker fed by the event router
//!
//! # Matching
//!
//! ```text
//! order confirmed / assignment reset
//!        ↓
//! candidates: online, idle, fits vehicle, within radius, not yet offered
//!        ↓
//! offer top candidate ──accept──→ PartnerAssigned (partner busy)
//!        │ reject / window elapsed
//!        ↓
//! next round ... rounds exhausted → AssignmentUnresolved (admin queue)
//! ```

pub mod engine;
pub mod geo;
pub mod location;
pub mod offers;
pub mod ranking;

pub use engine::{AssignmentEngine, MatchOutcome};
pub use location::{LocationProvider, LocationTable};
pub use offers::OfferBook;

use shared::partner::VehicleType;
use std::time::Duration;

/// Largest order (total item quantity) each vehicle type may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleCapacity {
    pub bicycle: u32,
    pub scooter: u32,
    pub motorcycle: u32,
    pub car: u32,
}

impl VehicleCapacity {
    pub fn for_vehicle(&self, kind: VehicleType) -> u32 {
        match kind {
            VehicleType::Bicycle => self.bicycle,
            VehicleType::Scooter => self.scooter,
            VehicleType::Motorcycle => self.motorcycle,
            VehicleType::Car => self.car,
        }
    }

    pub fn fits(&self, kind: VehicleType, item_count: u32) -> bool {
        item_count <= self.for_vehicle(kind)
    }
}

impl Default for VehicleCapacity {
    fn default() -> Self {
        Self {
            bicycle: 4,
            scooter: 8,
            motorcycle: 12,
            car: 40,
        }
    }
}

/// Matching parameters, supplied by configuration
#[derive(Debug, Clone)]
pub struct AssignmentConfig {
    /// Candidates farther than this from the pickup are skipped
    pub radius_km: f64,
    /// How long a partner has to answer an offer
    pub acceptance_window: Duration,
    /// Rounds before the order is flagged for an admin
    pub offer_rounds: u32,
    /// Bound on each location lookup
    pub location_timeout: Duration,
    pub capacity: VehicleCapacity,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            radius_km: 5.0,
            acceptance_window: Duration::from_secs(30),
            offer_rounds: 3,
            location_timeout: Duration::from_secs(2),
            capacity: VehicleCapacity::default(),
        }
    }
}
