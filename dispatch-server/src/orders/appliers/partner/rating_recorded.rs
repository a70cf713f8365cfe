//! RatingRecorded event applier
//!
//! Weighted running average: new = (avg * n + r) / (n + 1).

use crate::orders::traits::PartnerEventApplier;
use shared::partner::{PartnerEvent, PartnerEventPayload, PartnerSnapshot};

/// RatingRecorded applier
pub struct RatingRecordedApplier;

impl PartnerEventApplier for RatingRecordedApplier {
    fn apply(&self, snapshot: &mut PartnerSnapshot, event: &PartnerEvent) {
        if let PartnerEventPayload::RatingRecorded { rating, .. } = &event.payload {
            let count = f64::from(snapshot.rating_count);
            snapshot.rating = (snapshot.rating * count + f64::from(*rating)) / (count + 1.0);
            snapshot.rating_count += 1;

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
