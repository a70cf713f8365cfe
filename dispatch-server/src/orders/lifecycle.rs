//! Order status transition table
//!
//! ```text
//! pending → confirmed → preparing → out_for_delivery → delivered
//!    ↘          ↓           ↓
//!     cancelled ←───────────┘
//! ```
//!
//! Every legal edge lists the roles allowed to take it. Some edges carry an
//! extra guard that depends on the order itself (payment state, assigned
//! partner, ownership), checked in [`check_transition`].

use shared::order::{Actor, ActorRole, OrderSnapshot, OrderStatus};

use super::traits::OrderError;

use ActorRole::*;
use OrderStatus::*;

/// (from, to, allowed roles)
const TRANSITIONS: &[(OrderStatus, OrderStatus, &[ActorRole])] = &[
    (Pending, Confirmed, &[Shop, Admin, System]),
    (Confirmed, Preparing, &[Shop, Admin]),
    (Preparing, OutForDelivery, &[Partner, Admin]),
    (OutForDelivery, Delivered, &[Partner]),
    (Pending, Cancelled, &[Customer, Shop, Admin, System]),
    (Confirmed, Cancelled, &[Shop, Admin]),
    (Preparing, Cancelled, &[Shop, Admin]),
];

/// Roles allowed to move an order from `from` to `to`; empty if the edge is illegal
pub fn allowed_roles(from: OrderStatus, to: OrderStatus) -> &'static [ActorRole] {
    TRANSITIONS
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, roles)| *roles)
        .unwrap_or(&[])
}

pub fn is_legal_edge(from: OrderStatus, to: OrderStatus) -> bool {
    !allowed_roles(from, to).is_empty()
}

/// Statuses reachable from `from` in one step by any role
pub fn successors(from: OrderStatus) -> Vec<OrderStatus> {
    TRANSITIONS
        .iter()
        .filter(|(f, _, _)| *f == from)
        .map(|(_, t, _)| *t)
        .collect()
}

/// Outcome of a transition check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCheck {
    /// Already in the target status; succeed without an event
    NoOp,
    Allowed,
}

/// Roles allowed to move an order into `to` from any status
fn roles_entering(to: OrderStatus) -> impl Iterator<Item = ActorRole> {
    TRANSITIONS
        .iter()
        .filter(move |(_, t, _)| *t == to)
        .flat_map(|(_, _, roles)| roles.iter().copied())
}

/// Customers act on their own orders, shops on theirs, partners only on
/// orders assigned to them
fn acts_on(order: &OrderSnapshot, actor: &Actor) -> bool {
    match actor.role {
        Customer => actor.id == order.user_id,
        Shop => actor.id == order.shop_id,
        Partner => order.delivery_partner_id.as_deref() == Some(actor.id.as_str()),
        Admin | System => true,
    }
}

/// Validate a transition request against the table and the order's guards
///
/// A request for the current status is a no-op only for an actor who could
/// have taken the edge into it.
pub fn check_transition(
    order: &OrderSnapshot,
    target: OrderStatus,
    actor: &Actor,
) -> Result<TransitionCheck, OrderError> {
    let denied = || OrderError::InvalidTransition {
        from: order.status,
        to: target,
        role: actor.role,
    };

    let role_allowed = if order.status == target {
        roles_entering(target).any(|role| role == actor.role)
    } else {
        allowed_roles(order.status, target).contains(&actor.role)
    };
    if !role_allowed || !acts_on(order, actor) {
        return Err(denied());
    }

    if order.status == target {
        return Ok(TransitionCheck::NoOp);
    }

    match (order.status, target) {
        (Pending, Confirmed) if !order.payment.allows_confirmation() => {
            Err(OrderError::InvalidOperation(format!(
                "payment for order {} is {:?}; confirmation requires a captured payment",
                order.order_id, order.payment.status
            )))
        }
        (Preparing, OutForDelivery) if order.delivery_partner_id.is_none() => Err(
            OrderError::InvalidOperation(format!("order {} has no assigned partner", order.order_id)),
        ),
        _ => Ok(TransitionCheck::Allowed),
    }
}
