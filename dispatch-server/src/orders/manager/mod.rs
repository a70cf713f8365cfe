//! OrdersManager - command processing over the ledger
//!
//! # Command Flow
//!
//! ```text
//! execute_command(cmd)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Begin write transaction, re-check idempotency
//!     ├─ 3. Create CommandContext at the committed sequence
//!     ├─ 4. Convert command to action and execute
//!     ├─ 5. Fold events into order/partner projections
//!     ├─ 6. Persist events, projections and indexes
//!     ├─ 7. Advance sequence, mark command processed
//!     ├─ 8. Commit
//!     └─ 9. Broadcast order events
//! ```
//!
//! redb admits one write transaction at a time, so commands touching the
//! same order or partner are applied strictly one after another and each one
//! validates against the state its predecessor committed. Slow work (offer
//! windows, location lookups) happens outside the transaction.

mod error;
pub use error::*;

use super::actions::{ActionDefaults, CommandAction};
use super::appliers::{apply_order_event, apply_partner_event};
use super::reducer::{replay_order, replay_partner};
use super::storage::{LedgerStorage, StorageError, StorageStats};
use super::traits::{CommandContext, CommandHandler, CommandMetadata, LedgerEvent};
use shared::command::{CommandResponse, LedgerCommand};
use shared::order::{OrderEvent, OrderEventPayload, OrderSnapshot};
use shared::partner::{PartnerEvent, PartnerSnapshot};
use std::path::Path;
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 65536;

/// Single entry point for every ledger mutation
pub struct OrdersManager {
    storage: LedgerStorage,
    event_tx: broadcast::Sender<OrderEvent>,
    defaults: ActionDefaults,
    /// Server instance epoch, regenerated on every start
    epoch: String,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<LedgerStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl OrdersManager {
    /// Open the ledger at `db_path`
    pub fn new(db_path: impl AsRef<Path>, defaults: ActionDefaults) -> ManagerResult<Self> {
        let storage = LedgerStorage::open(db_path)?;
        let manager = Self::with_storage(storage, defaults);
        tracing::info!(epoch = %manager.epoch, "OrdersManager started with new epoch");
        Ok(manager)
    }

    /// Wrap an already opened ledger
    pub fn with_storage(storage: LedgerStorage, defaults: ActionDefaults) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            event_tx,
            defaults,
            epoch: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Subscribe to committed order events
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    pub fn storage(&self) -> &LedgerStorage {
        &self.storage
    }

    /// Execute a command and return the response
    pub fn execute_command(&self, cmd: LedgerCommand) -> CommandResponse {
        self.execute_command_with_events(cmd).0
    }

    /// Execute a command and return both the response and the committed events
    pub fn execute_command_with_events(
        &self,
        cmd: LedgerCommand,
    ) -> (CommandResponse, Vec<LedgerEvent>) {
        let command_id = cmd.command_id.clone();
        match self.process_command(cmd) {
            Ok((response, events)) => {
                self.broadcast(&events);
                (response, events)
            }
            Err(err) => {
                tracing::debug!(command_id = %command_id, error = %err, "Command rejected");
                (CommandResponse::error(command_id, err.into()), vec![])
            }
        }
    }

    /// Execute a command, surfacing a rejection as a typed error
    pub fn execute(&self, cmd: LedgerCommand) -> ManagerResult<CommandResponse> {
        let command_id = cmd.command_id.clone();
        match self.process_command(cmd) {
            Ok((response, events)) => {
                self.broadcast(&events);
                Ok(response)
            }
            Err(err) => {
                tracing::debug!(command_id = %command_id, error = %err, "Command rejected");
                Err(err)
            }
        }
    }

    fn broadcast(&self, events: &[LedgerEvent]) {
        for event in events {
            if let LedgerEvent::Order(order_event) = event
                && self.event_tx.send(order_event.clone()).is_err()
            {
                tracing::debug!("Event broadcast skipped: no active receivers");
                break;
            }
        }
    }

    fn process_command(
        &self,
        cmd: LedgerCommand,
    ) -> ManagerResult<(CommandResponse, Vec<LedgerEvent>)> {
        tracing::debug!(command_id = %cmd.command_id, payload = ?cmd.payload, "Processing command");

        // 1. Idempotency check (before transaction)
        if self.storage.is_command_processed(&cmd.command_id)? {
            tracing::debug!(command_id = %cmd.command_id, "Duplicate command");
            return Ok((CommandResponse::duplicate(cmd.command_id), vec![]));
        }

        // 2. Begin write transaction; a concurrent writer may have committed
        // the same command while we waited for it
        let txn = self.storage.begin_write()?;
        if self.storage.is_command_processed_txn(&txn, &cmd.command_id)? {
            return Ok((CommandResponse::duplicate(cmd.command_id), vec![]));
        }

        // 3. Context at the committed sequence
        let current_sequence = self.storage.get_current_sequence_txn(&txn)?;
        let mut ctx = CommandContext::new(&txn, &self.storage, current_sequence);
        let metadata = CommandMetadata {
            command_id: cmd.command_id.clone(),
            actor_id: cmd.actor.id.clone(),
            actor_name: cmd.actor.name.clone(),
            actor_role: cmd.actor.role,
            timestamp: cmd.timestamp,
        };

        // 4. Convert to action and execute
        let action = CommandAction::from_command(&cmd, &self.defaults);
        let events = futures::executor::block_on(action.execute(&mut ctx, &metadata))?;

        // 5. Fold events into projections
        for event in &events {
            match event {
                LedgerEvent::Order(e) => {
                    let mut snapshot = ctx
                        .find_order(&e.order_id)?
                        .unwrap_or_else(|| OrderSnapshot::new(e.order_id.clone()));
                    apply_order_event(&mut snapshot, e);
                    ctx.save_order(snapshot);
                }
                LedgerEvent::Partner(e) => {
                    let mut snapshot = ctx
                        .find_partner(&e.partner_id)?
                        .unwrap_or_else(|| PartnerSnapshot::new(e.partner_id.clone()));
                    apply_partner_event(&mut snapshot, e);
                    ctx.save_partner(snapshot);
                }
            }
        }

        // 6. Persist events, projections and indexes
        for event in &events {
            match event {
                LedgerEvent::Order(e) => {
                    self.storage.store_order_event(&txn, e)?;
                    match &e.payload {
                        OrderEventPayload::OrderPlaced { payment, .. } => {
                            if let Some(reference) = &payment.razorpay_order_id {
                                self.storage.put_payment_ref(&txn, reference, &e.order_id)?;
                            }
                        }
                        OrderEventPayload::PaymentRetried { razorpay_order_id } => {
                            self.storage
                                .put_payment_ref(&txn, razorpay_order_id, &e.order_id)?;
                        }
                        _ => {}
                    }
                }
                LedgerEvent::Partner(e) => self.storage.store_partner_event(&txn, e)?,
            }
        }

        for snapshot in ctx.modified_orders() {
            self.storage.store_order_snapshot(&txn, snapshot)?;
            if snapshot.assignment.flag.is_some() && !snapshot.is_terminal() {
                self.storage.mark_unassigned(&txn, &snapshot.order_id)?;
            } else {
                self.storage.clear_unassigned(&txn, &snapshot.order_id)?;
            }
        }
        for snapshot in ctx.modified_partners() {
            self.storage.store_partner_snapshot(&txn, snapshot)?;
        }

        // 7. Advance sequence, mark processed
        let max_sequence = events
            .iter()
            .map(LedgerEvent::sequence)
            .max()
            .unwrap_or(current_sequence);
        if max_sequence > current_sequence {
            self.storage.set_sequence(&txn, max_sequence)?;
        }
        self.storage.mark_command_processed(&txn, &cmd.command_id)?;

        // 8. Commit
        drop(ctx);
        txn.commit().map_err(StorageError::from)?;

        let order_id = cmd.payload.order_id().map(str::to_string);
        let partner_id = cmd.payload.partner_id().map(str::to_string);
        tracing::info!(
            command_id = %cmd.command_id,
            order_id = ?order_id,
            partner_id = ?partner_id,
            event_count = events.len(),
            sequence = max_sequence,
            "Command processed"
        );
        Ok((
            CommandResponse::success(cmd.command_id, order_id, partner_id),
            events,
        ))
    }

    // ========== Queries ==========

    pub fn get_order(&self, order_id: &str) -> ManagerResult<Option<OrderSnapshot>> {
        Ok(self.storage.get_order_snapshot(order_id)?)
    }

    pub fn get_partner(&self, partner_id: &str) -> ManagerResult<Option<PartnerSnapshot>> {
        Ok(self.storage.get_partner_snapshot(partner_id)?)
    }

    pub fn all_orders(&self) -> ManagerResult<Vec<OrderSnapshot>> {
        Ok(self.storage.get_all_order_snapshots()?)
    }

    pub fn all_partners(&self) -> ManagerResult<Vec<PartnerSnapshot>> {
        Ok(self.storage.get_all_partner_snapshots()?)
    }

    /// Orders flagged `UnassignedTimeout` and still open
    pub fn list_unassigned(&self) -> ManagerResult<Vec<OrderSnapshot>> {
        Ok(self.storage.get_unassigned_orders()?)
    }

    pub fn order_events(&self, order_id: &str) -> ManagerResult<Vec<OrderEvent>> {
        Ok(self.storage.get_order_events(order_id)?)
    }

    pub fn partner_events(&self, partner_id: &str) -> ManagerResult<Vec<PartnerEvent>> {
        Ok(self.storage.get_partner_events(partner_id)?)
    }

    /// Order events committed after `since_sequence`
    pub fn events_since(&self, since_sequence: u64) -> ManagerResult<Vec<OrderEvent>> {
        Ok(self.storage.get_order_events_since(since_sequence)?)
    }

    pub fn current_sequence(&self) -> ManagerResult<u64> {
        Ok(self.storage.get_current_sequence()?)
    }

    /// Resolve a gateway reference to its order
    pub fn find_order_by_payment_ref(&self, razorpay_order_id: &str) -> ManagerResult<String> {
        self.storage
            .find_order_by_payment_ref(razorpay_order_id)?
            .ok_or_else(|| ManagerError::UnknownPaymentReference(razorpay_order_id.to_string()))
    }

    pub fn stats(&self) -> ManagerResult<StorageStats> {
        Ok(self.storage.get_stats()?)
    }

    // ========== Audit ==========

    /// Rebuild an order projection from its events
    pub fn rebuild_order(&self, order_id: &str) -> ManagerResult<OrderSnapshot> {
        let events = self.storage.get_order_events(order_id)?;
        replay_order(&events).ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    /// Rebuild a partner projection from its events
    pub fn rebuild_partner(&self, partner_id: &str) -> ManagerResult<PartnerSnapshot> {
        let events = self.storage.get_partner_events(partner_id)?;
        replay_partner(&events)
            .ok_or_else(|| ManagerError::PartnerNotFound(partner_id.to_string()))
    }

    /// Compare the stored order projection with a replay of its events
    pub fn verify_order(&self, order_id: &str) -> ManagerResult<bool> {
        let stored = self
            .get_order(order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        let rebuilt = self.rebuild_order(order_id)?;
        let consistent = stored.verify_checksum()
            && stored.state_checksum == rebuilt.state_checksum
            && stored == rebuilt;
        if !consistent {
            tracing::warn!(
                order_id = %order_id,
                stored_checksum = %stored.state_checksum,
                rebuilt_checksum = %rebuilt.state_checksum,
                "Order projection drifted from its event stream"
            );
        }
        Ok(consistent)
    }

    /// Compare the stored partner projection with a replay of its events
    pub fn verify_partner(&self, partner_id: &str) -> ManagerResult<bool> {
        let stored = self
            .get_partner(partner_id)?
            .ok_or_else(|| ManagerError::PartnerNotFound(partner_id.to_string()))?;
        let rebuilt = self.rebuild_partner(partner_id)?;
        let consistent = stored.verify_checksum() && stored == rebuilt;
        if !consistent {
            tracing::warn!(partner_id = %partner_id, "Partner projection drifted from its event stream");
        }
        Ok(consistent)
    }
}

impl Clone for OrdersManager {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            event_tx: self.event_tx.clone(),
            defaults: self.defaults,
            epoch: self.epoch.clone(),
        }
    }
}

#[cfg(test)]
mod tests;
