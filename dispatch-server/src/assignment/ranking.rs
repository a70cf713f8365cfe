//! Candidate ranking
//!
//! Order of precedence:
//! 1. distance to the pickup, nearest first (metre resolution)
//! 2. rating, highest first
//! 3. deliveries completed today, fewest first
//! 4. joined earliest first
//!
//! The partner id breaks any remaining tie so the order is total.

use std::cmp::Ordering;

/// A partner eligible for an offer
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub partner_id: String,
    pub distance_km: f64,
    pub distance_m: u64,
    pub rating: f64,
    pub today_deliveries: u32,
    pub joined_at: i64,
}

pub fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    a.distance_m
        .cmp(&b.distance_m)
        .then_with(|| b.rating.total_cmp(&a.rating))
        .then_with(|| a.today_deliveries.cmp(&b.today_deliveries))
        .then_with(|| a.joined_at.cmp(&b.joined_at))
        .then_with(|| a.partner_id.cmp(&b.partner_id))
}

/// Sort candidates best first
pub fn rank(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(compare);
    candidates
}
