//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles
//! one specific command type.

use async_trait::async_trait;
use chrono_tz::Tz;

use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use shared::command::{CommandPayload, LedgerCommand};
use shared::order::{ActorRole, OrderEvent, OrderEventPayload};
use shared::partner::{PartnerEvent, PartnerEventPayload};

mod apply_payment_outcome;
mod assign_partner;
mod credit_delivery;
mod flag_unassigned;
mod place_order;
mod rate_delivery;
mod reassign_order;
mod record_offer;
mod register_partner;
mod resolve_offer;
mod retry_payment;
mod rollover_earnings;
mod set_partner_availability;
mod transition_order;

pub use apply_payment_outcome::ApplyPaymentOutcomeAction;
pub use assign_partner::AssignPartnerAction;
pub use credit_delivery::CreditDeliveryAction;
pub use flag_unassigned::FlagUnassignedAction;
pub use place_order::PlaceOrderAction;
pub use rate_delivery::RateDeliveryAction;
pub use reassign_order::ReassignOrderAction;
pub use record_offer::RecordOfferAction;
pub use register_partner::RegisterPartnerAction;
pub use resolve_offer::ResolveOfferAction;
pub use retry_payment::RetryPaymentAction;
pub use rollover_earnings::RollOverEarningsAction;
pub use set_partner_availability::SetPartnerAvailabilityAction;
pub use transition_order::TransitionOrderAction;

/// Values actions need that do not travel in the command
#[derive(Debug, Clone, Copy)]
pub struct ActionDefaults {
    /// Timezone for partners registered without one
    pub timezone: Tz,
}

impl Default for ActionDefaults {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
        }
    }
}

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    PlaceOrder(PlaceOrderAction),
    TransitionOrder(TransitionOrderAction),
    ApplyPaymentOutcome(ApplyPaymentOutcomeAction),
    RetryPayment(RetryPaymentAction),
    RecordOffer(RecordOfferAction),
    ResolveOffer(ResolveOfferAction),
    AssignPartner(AssignPartnerAction),
    ReassignOrder(ReassignOrderAction),
    FlagUnassigned(FlagUnassignedAction),
    RateDelivery(RateDeliveryAction),
    RegisterPartner(RegisterPartnerAction),
    SetPartnerAvailability(SetPartnerAvailabilityAction),
    CreditDelivery(CreditDeliveryAction),
    RollOverEarnings(RollOverEarningsAction),
}

#[async_trait]
impl CommandHandler for CommandAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        match self {
            CommandAction::PlaceOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::TransitionOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::ApplyPaymentOutcome(action) => action.execute(ctx, metadata).await,
            CommandAction::RetryPayment(action) => action.execute(ctx, metadata).await,
            CommandAction::RecordOffer(action) => action.execute(ctx, metadata).await,
            CommandAction::ResolveOffer(action) => action.execute(ctx, metadata).await,
            CommandAction::AssignPartner(action) => action.execute(ctx, metadata).await,
            CommandAction::ReassignOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::FlagUnassigned(action) => action.execute(ctx, metadata).await,
            CommandAction::RateDelivery(action) => action.execute(ctx, metadata).await,
            CommandAction::RegisterPartner(action) => action.execute(ctx, metadata).await,
            CommandAction::SetPartnerAvailability(action) => action.execute(ctx, metadata).await,
            CommandAction::CreditDelivery(action) => action.execute(ctx, metadata).await,
            CommandAction::RollOverEarnings(action) => action.execute(ctx, metadata).await,
        }
    }
}

impl CommandAction {
    /// Convert a ledger command into its action
    ///
    /// This is the ONLY place with a match on CommandPayload.
    pub fn from_command(cmd: &LedgerCommand, defaults: &ActionDefaults) -> Self {
        match &cmd.payload {
            CommandPayload::PlaceOrder { order_id, input } => {
                CommandAction::PlaceOrder(PlaceOrderAction {
                    order_id: order_id.clone(),
                    input: input.clone(),
                })
            }
            CommandPayload::TransitionOrder {
                order_id,
                target,
                reason,
            } => CommandAction::TransitionOrder(TransitionOrderAction {
                order_id: order_id.clone(),
                target: *target,
                reason: reason.clone(),
            }),
            CommandPayload::ApplyPaymentOutcome {
                order_id,
                razorpay_order_id,
                razorpay_payment_id,
                status,
            } => CommandAction::ApplyPaymentOutcome(ApplyPaymentOutcomeAction {
                order_id: order_id.clone(),
                razorpay_order_id: razorpay_order_id.clone(),
                razorpay_payment_id: razorpay_payment_id.clone(),
                status: *status,
            }),
            CommandPayload::RetryPayment {
                order_id,
                razorpay_order_id,
            } => CommandAction::RetryPayment(RetryPaymentAction {
                order_id: order_id.clone(),
                razorpay_order_id: razorpay_order_id.clone(),
            }),
            CommandPayload::RecordOffer {
                order_id,
                partner_id,
                round,
                distance_km,
                expires_at,
            } => CommandAction::RecordOffer(RecordOfferAction {
                order_id: order_id.clone(),
                partner_id: partner_id.clone(),
                round: *round,
                distance_km: *distance_km,
                expires_at: *expires_at,
            }),
            CommandPayload::ResolveOffer {
                order_id,
                partner_id,
                round,
                outcome,
            } => CommandAction::ResolveOffer(ResolveOfferAction {
                order_id: order_id.clone(),
                partner_id: partner_id.clone(),
                round: *round,
                outcome: *outcome,
            }),
            CommandPayload::AssignPartner {
                order_id,
                partner_id,
                manual,
            } => CommandAction::AssignPartner(AssignPartnerAction {
                order_id: order_id.clone(),
                partner_id: partner_id.clone(),
                manual: *manual,
            }),
            CommandPayload::ReassignOrder { order_id, reason } => {
                CommandAction::ReassignOrder(ReassignOrderAction {
                    order_id: order_id.clone(),
                    reason: reason.clone(),
                })
            }
            CommandPayload::FlagUnassigned { order_id, rounds } => {
                CommandAction::FlagUnassigned(FlagUnassignedAction {
                    order_id: order_id.clone(),
                    rounds: *rounds,
                })
            }
            CommandPayload::RateDelivery { order_id, rating } => {
                CommandAction::RateDelivery(RateDeliveryAction {
                    order_id: order_id.clone(),
                    rating: *rating,
                })
            }
            CommandPayload::RegisterPartner {
                partner_id,
                name,
                phone,
                vehicle,
                timezone,
            } => CommandAction::RegisterPartner(RegisterPartnerAction {
                partner_id: partner_id.clone(),
                name: name.clone(),
                phone: phone.clone(),
                vehicle: vehicle.clone(),
                timezone: timezone.clone(),
                default_timezone: defaults.timezone,
            }),
            CommandPayload::SetPartnerAvailability { partner_id, status } => {
                CommandAction::SetPartnerAvailability(SetPartnerAvailabilityAction {
                    partner_id: partner_id.clone(),
                    status: *status,
                })
            }
            CommandPayload::CreditDelivery {
                order_id,
                partner_id,
                amount,
            } => CommandAction::CreditDelivery(CreditDeliveryAction {
                order_id: order_id.clone(),
                partner_id: partner_id.clone(),
                amount: *amount,
                fallback_timezone: defaults.timezone,
            }),
            CommandPayload::RollOverEarnings { partner_id } => {
                CommandAction::RollOverEarnings(RollOverEarningsAction {
                    partner_id: partner_id.clone(),
                    fallback_timezone: defaults.timezone,
                })
            }
        }
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Fail with `PermissionDenied` unless the actor holds one of `roles`
pub(crate) fn require_role(metadata: &CommandMetadata, roles: &[ActorRole]) -> Result<(), OrderError> {
    if roles.contains(&metadata.actor_role) {
        Ok(())
    } else {
        Err(OrderError::PermissionDenied(format!(
            "{} may not perform this operation",
            metadata.actor_role
        )))
    }
}

/// Build an order event stamped with the next sequence and the command metadata
pub(crate) fn order_event(
    ctx: &mut CommandContext<'_>,
    metadata: &CommandMetadata,
    order_id: &str,
    payload: OrderEventPayload,
) -> LedgerEvent {
    let seq = ctx.next_sequence();
    let event_type = payload.event_type();
    OrderEvent::new(
        seq,
        order_id.to_string(),
        metadata.actor_id.clone(),
        metadata.actor_role,
        metadata.command_id.clone(),
        Some(metadata.timestamp),
        event_type,
        payload,
    )
    .into()
}

/// Build a partner event stamped with the next sequence and the command metadata
pub(crate) fn partner_event(
    ctx: &mut CommandContext<'_>,
    metadata: &CommandMetadata,
    partner_id: &str,
    payload: PartnerEventPayload,
) -> LedgerEvent {
    let seq = ctx.next_sequence();
    PartnerEvent::new(
        seq,
        partner_id.to_string(),
        metadata.actor_id.clone(),
        metadata.actor_role,
        metadata.command_id.clone(),
        payload,
    )
    .into()
}
