//! Command and event traits for the ledger
//!
//! - [`CommandHandler`]: actions validate a command against the current
//!   projections and produce events
//! - [`EventApplier`] / [`PartnerEventApplier`]: pure functions folding one
//!   event into a projection
//! - [`CommandContext`]: the write transaction plus the projections loaded or
//!   modified while a command runs

use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use redb::WriteTransaction;
use shared::command::CommandErrorCode;
use shared::order::{Actor, ActorRole, OrderEvent, OrderSnapshot, OrderStatus};
use shared::partner::{PartnerEvent, PartnerSnapshot};
use std::collections::BTreeMap;
use thiserror::Error;

use super::storage::{LedgerStorage, StorageError};

/// Domain failures raised by actions
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Partner not found: {0}")]
    PartnerNotFound(String),

    #[error("Invalid transition {from} -> {to} for {role}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
        role: ActorRole,
    },

    #[error("Invalid reassignment: {0}")]
    InvalidReassignment(String),

    #[error("Offer expired: {0}")]
    OfferExpired(String),

    #[error("Partner unavailable: {0}")]
    PartnerUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl OrderError {
    pub fn code(&self) -> CommandErrorCode {
        match self {
            OrderError::OrderNotFound(_) | OrderError::PartnerNotFound(_) => {
                CommandErrorCode::NotFound
            }
            OrderError::InvalidTransition { .. } => CommandErrorCode::InvalidTransition,
            OrderError::InvalidReassignment(_) => CommandErrorCode::InvalidReassignment,
            OrderError::OfferExpired(_) => CommandErrorCode::OfferExpired,
            OrderError::PartnerUnavailable(_) => CommandErrorCode::PartnerUnavailable,
            OrderError::PermissionDenied(_) => CommandErrorCode::PermissionDenied,
            OrderError::InvalidOperation(_) => CommandErrorCode::InvalidOperation,
            OrderError::Validation(_) => CommandErrorCode::ValidationFailed,
            OrderError::Storage(_) => CommandErrorCode::InternalError,
        }
    }
}

impl From<StorageError> for OrderError {
    fn from(err: StorageError) -> Self {
        OrderError::Storage(err.to_string())
    }
}

/// Event produced by an action, tagged with the aggregate it belongs to
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    Order(OrderEvent),
    Partner(PartnerEvent),
}

impl LedgerEvent {
    pub fn sequence(&self) -> u64 {
        match self {
            LedgerEvent::Order(e) => e.sequence,
            LedgerEvent::Partner(e) => e.sequence,
        }
    }
}

impl From<OrderEvent> for LedgerEvent {
    fn from(event: OrderEvent) -> Self {
        LedgerEvent::Order(event)
    }
}

impl From<PartnerEvent> for LedgerEvent {
    fn from(event: PartnerEvent) -> Self {
        LedgerEvent::Partner(event)
    }
}

/// Command metadata copied onto every event
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub actor_id: String,
    pub actor_name: String,
    pub actor_role: ActorRole,
    /// Client timestamp
    pub timestamp: i64,
}

impl CommandMetadata {
    pub fn actor(&self) -> Actor {
        Actor::new(self.actor_id.clone(), self.actor_name.clone(), self.actor_role)
    }

    pub fn is(&self, role: ActorRole) -> bool {
        self.actor_role == role
    }
}

/// Execution context for one command
///
/// Holds the open write transaction and the projections touched so far.
/// Loads consult the working set first so an action sees its own writes.
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a LedgerStorage,
    sequence: u64,
    orders: BTreeMap<String, OrderSnapshot>,
    partners: BTreeMap<String, PartnerSnapshot>,
}

impl<'a> CommandContext<'a> {
    pub fn new(txn: &'a WriteTransaction, storage: &'a LedgerStorage, current_sequence: u64) -> Self {
        Self {
            txn,
            storage,
            sequence: current_sequence,
            orders: BTreeMap::new(),
            partners: BTreeMap::new(),
        }
    }

    /// Allocate the next global sequence number
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    // ========== Orders ==========

    pub fn find_order(&self, order_id: &str) -> Result<Option<OrderSnapshot>, OrderError> {
        if let Some(snapshot) = self.orders.get(order_id) {
            return Ok(Some(snapshot.clone()));
        }
        Ok(self.storage.get_order_snapshot_txn(self.txn, order_id)?)
    }

    pub fn load_order(&self, order_id: &str) -> Result<OrderSnapshot, OrderError> {
        self.find_order(order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
    }

    pub fn save_order(&mut self, snapshot: OrderSnapshot) {
        self.orders.insert(snapshot.order_id.clone(), snapshot);
    }

    pub fn modified_orders(&self) -> impl Iterator<Item = &OrderSnapshot> {
        self.orders.values()
    }

    // ========== Partners ==========

    pub fn find_partner(&self, partner_id: &str) -> Result<Option<PartnerSnapshot>, OrderError> {
        if let Some(snapshot) = self.partners.get(partner_id) {
            return Ok(Some(snapshot.clone()));
        }
        Ok(self.storage.get_partner_snapshot_txn(self.txn, partner_id)?)
    }

    pub fn load_partner(&self, partner_id: &str) -> Result<PartnerSnapshot, OrderError> {
        self.find_partner(partner_id)?
            .ok_or_else(|| OrderError::PartnerNotFound(partner_id.to_string()))
    }

    pub fn save_partner(&mut self, snapshot: PartnerSnapshot) {
        self.partners.insert(snapshot.partner_id.clone(), snapshot);
    }

    pub fn modified_partners(&self) -> impl Iterator<Item = &PartnerSnapshot> {
        self.partners.values()
    }

    /// Committed events of a partner (excludes events of the running command)
    pub fn partner_events(&self, partner_id: &str) -> Result<Vec<PartnerEvent>, OrderError> {
        Ok(self.storage.get_partner_events_txn(self.txn, partner_id)?)
    }

    pub fn payment_ref_exists(&self, razorpay_order_id: &str) -> Result<bool, OrderError> {
        Ok(self.storage.payment_ref_exists_txn(self.txn, razorpay_order_id)?)
    }
}

/// Command handler: validate and produce events
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError>;
}

/// Order event applier; must be pure
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent);
}

/// Partner event applier; must be pure
#[enum_dispatch]
pub trait PartnerEventApplier {
    fn apply(&self, snapshot: &mut PartnerSnapshot, event: &PartnerEvent);
}
