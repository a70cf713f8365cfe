//! Event applier implementations
//!
//! Each applier implements `EventApplier` (orders) or `PartnerEventApplier`
//! (partners) and folds one event type into a projection. Appliers are PURE:
//! no clock reads, no storage access, so replay reproduces the projection.

use enum_dispatch::enum_dispatch;

use shared::order::{OrderEvent, OrderEventPayload, OrderSnapshot};
use shared::partner::{PartnerEvent, PartnerEventPayload, PartnerSnapshot};

use crate::orders::traits::{EventApplier, PartnerEventApplier};

mod assignment_offered;
mod assignment_rejected;
mod assignment_reset;
mod assignment_unresolved;
mod delivery_rated;
mod order_placed;
mod partner_assigned;
mod payment_retried;
mod payment_updated;
mod status_changed;

pub mod partner;

pub use assignment_offered::AssignmentOfferedApplier;
pub use assignment_rejected::AssignmentRejectedApplier;
pub use assignment_reset::AssignmentResetApplier;
pub use assignment_unresolved::AssignmentUnresolvedApplier;
pub use delivery_rated::DeliveryRatedApplier;
pub use order_placed::OrderPlacedApplier;
pub use partner_assigned::PartnerAssignedApplier;
pub use payment_retried::PaymentRetriedApplier;
pub use payment_updated::PaymentUpdatedApplier;
pub use status_changed::StatusChangedApplier;

use partner::{
    AvailabilityChangedApplier, DeliveryCreditedApplier, EarningsRolledOverApplier,
    OrderReleasedApplier, OrderReservedApplier, PartnerRegisteredApplier, RatingRecordedApplier,
};

/// EventAction enum - dispatches order events to their applier
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    OrderPlaced(OrderPlacedApplier),
    StatusChanged(StatusChangedApplier),
    PaymentUpdated(PaymentUpdatedApplier),
    PaymentRetried(PaymentRetriedApplier),
    AssignmentOffered(AssignmentOfferedApplier),
    AssignmentRejected(AssignmentRejectedApplier),
    PartnerAssigned(PartnerAssignedApplier),
    AssignmentReset(AssignmentResetApplier),
    AssignmentUnresolved(AssignmentUnresolvedApplier),
    DeliveryRated(DeliveryRatedApplier),
}

/// This is the ONLY place with a match on OrderEventPayload for applying.
impl From<&OrderEvent> for EventAction {
    fn from(event: &OrderEvent) -> Self {
        match &event.payload {
            OrderEventPayload::OrderPlaced { .. } => EventAction::OrderPlaced(OrderPlacedApplier),
            OrderEventPayload::StatusChanged { .. } => {
                EventAction::StatusChanged(StatusChangedApplier)
            }
            OrderEventPayload::PaymentUpdated { .. } => {
                EventAction::PaymentUpdated(PaymentUpdatedApplier)
            }
            OrderEventPayload::PaymentRetried { .. } => {
                EventAction::PaymentRetried(PaymentRetriedApplier)
            }
            OrderEventPayload::AssignmentOffered { .. } => {
                EventAction::AssignmentOffered(AssignmentOfferedApplier)
            }
            OrderEventPayload::AssignmentRejected { .. } => {
                EventAction::AssignmentRejected(AssignmentRejectedApplier)
            }
            OrderEventPayload::PartnerAssigned { .. } => {
                EventAction::PartnerAssigned(PartnerAssignedApplier)
            }
            OrderEventPayload::AssignmentReset { .. } => {
                EventAction::AssignmentReset(AssignmentResetApplier)
            }
            OrderEventPayload::AssignmentUnresolved { .. } => {
                EventAction::AssignmentUnresolved(AssignmentUnresolvedApplier)
            }
            OrderEventPayload::DeliveryRated { .. } => {
                EventAction::DeliveryRated(DeliveryRatedApplier)
            }
        }
    }
}

/// PartnerEventAction enum - dispatches partner events to their applier
#[enum_dispatch(PartnerEventApplier)]
pub enum PartnerEventAction {
    PartnerRegistered(PartnerRegisteredApplier),
    AvailabilityChanged(AvailabilityChangedApplier),
    OrderReserved(OrderReservedApplier),
    OrderReleased(OrderReleasedApplier),
    DeliveryCredited(DeliveryCreditedApplier),
    RatingRecorded(RatingRecordedApplier),
    EarningsRolledOver(EarningsRolledOverApplier),
}

impl From<&PartnerEvent> for PartnerEventAction {
    fn from(event: &PartnerEvent) -> Self {
        match &event.payload {
            PartnerEventPayload::PartnerRegistered { .. } => {
                PartnerEventAction::PartnerRegistered(PartnerRegisteredApplier)
            }
            PartnerEventPayload::AvailabilityChanged { .. } => {
                PartnerEventAction::AvailabilityChanged(AvailabilityChangedApplier)
            }
            PartnerEventPayload::OrderReserved { .. } => {
                PartnerEventAction::OrderReserved(OrderReservedApplier)
            }
            PartnerEventPayload::OrderReleased { .. } => {
                PartnerEventAction::OrderReleased(OrderReleasedApplier)
            }
            PartnerEventPayload::DeliveryCredited { .. } => {
                PartnerEventAction::DeliveryCredited(DeliveryCreditedApplier)
            }
            PartnerEventPayload::RatingRecorded { .. } => {
                PartnerEventAction::RatingRecorded(RatingRecordedApplier)
            }
            PartnerEventPayload::EarningsRolledOver { .. } => {
                PartnerEventAction::EarningsRolledOver(EarningsRolledOverApplier)
            }
        }
    }
}

/// Apply one order event through its applier
pub fn apply_order_event(snapshot: &mut OrderSnapshot, event: &OrderEvent) {
    let applier: EventAction = event.into();
    applier.apply(snapshot, event);
}

/// Apply one partner event through its applier
pub fn apply_partner_event(snapshot: &mut PartnerSnapshot, event: &PartnerEvent) {
    let applier: PartnerEventAction = event.into();
    applier.apply(snapshot, event);
}
