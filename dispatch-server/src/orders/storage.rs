//! redb-based ledger storage for orders and delivery partners
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `order_events` | `(order_id, sequence)` | `OrderEvent` | Order event stream (append-only) |
//! | `order_snapshots` | `order_id` | `OrderSnapshot` | Order projection |
//! | `partner_events` | `(partner_id, sequence)` | `PartnerEvent` | Partner event stream (append-only) |
//! | `partner_snapshots` | `partner_id` | `PartnerSnapshot` | Partner projection |
//! | `payment_refs` | `razorpay_order_id` | `order_id` | Gateway reference index |
//! | `unassigned_orders` | `order_id` | `()` | Orders flagged `UnassignedTimeout` |
//! | `processed_commands` | `command_id` | `()` | Idempotency check |
//! | `sequence_counter` | `"seq"` | `u64` | Global sequence |
//!
//! Every command commits its events, the projections they touch and the
//! index updates in one write transaction.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::order::{OrderEvent, OrderSnapshot};
use shared::partner::{PartnerEvent, PartnerSnapshot};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const ORDER_EVENTS_TABLE: TableDefinition<(&str, u64), &[u8]> =
    TableDefinition::new("order_events");

const ORDER_SNAPSHOTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("order_snapshots");

const PARTNER_EVENTS_TABLE: TableDefinition<(&str, u64), &[u8]> =
    TableDefinition::new("partner_events");

const PARTNER_SNAPSHOTS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("partner_snapshots");

/// razorpay_order_id -> order_id
const PAYMENT_REFS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("payment_refs");

const UNASSIGNED_ORDERS_TABLE: TableDefinition<&str, ()> =
    TableDefinition::new("unassigned_orders");

const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, ()> =
    TableDefinition::new("processed_commands");

const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const SEQUENCE_KEY: &str = "seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Ledger storage backed by redb
#[derive(Clone)]
pub struct LedgerStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for LedgerStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStorage").finish_non_exhaustive()
    }
}

impl LedgerStorage {
    /// Open or create the ledger at the given path
    ///
    /// redb commits are durable once `commit()` returns (copy-on-write with
    /// an atomic root swap), so a crash never exposes a half-applied command.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory ledger (tests and throwaway runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDER_EVENTS_TABLE)?;
            let _ = write_txn.open_table(ORDER_SNAPSHOTS_TABLE)?;
            let _ = write_txn.open_table(PARTNER_EVENTS_TABLE)?;
            let _ = write_txn.open_table(PARTNER_SNAPSHOTS_TABLE)?;
            let _ = write_txn.open_table(PAYMENT_REFS_TABLE)?;
            let _ = write_txn.open_table(UNASSIGNED_ORDERS_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence ==========

    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table.get(SEQUENCE_KEY)?.map(|guard| guard.value()).unwrap_or(0))
    }

    /// Current sequence as seen by an open write transaction
    pub fn get_current_sequence_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let table = txn.open_table(SEQUENCE_TABLE)?;
        Ok(table.get(SEQUENCE_KEY)?.map(|guard| guard.value()).unwrap_or(0))
    }

    pub fn set_sequence(&self, txn: &WriteTransaction, sequence: u64) -> StorageResult<()> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        table.insert(SEQUENCE_KEY, sequence)?;
        Ok(())
    }

    // ========== Command Idempotency ==========

    pub fn is_command_processed(&self, command_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    pub fn is_command_processed_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, ())?;
        Ok(())
    }

    // ========== Order Events ==========

    pub fn store_order_event(&self, txn: &WriteTransaction, event: &OrderEvent) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_EVENTS_TABLE)?;
        let value = serde_json::to_vec(event)?;
        table.insert((event.order_id.as_str(), event.sequence), value.as_slice())?;
        Ok(())
    }

    /// All events of one order, in sequence order
    pub fn get_order_events(&self, order_id: &str) -> StorageResult<Vec<OrderEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.range((order_id, 0u64)..=(order_id, u64::MAX))? {
            let (_key, value) = result?;
            events.push(serde_json::from_slice::<OrderEvent>(value.value())?);
        }
        Ok(events)
    }

    /// Order events with a sequence above `since_sequence`, across all orders
    pub fn get_order_events_since(&self, since_sequence: u64) -> StorageResult<Vec<OrderEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            if key.value().1 > since_sequence {
                events.push(serde_json::from_slice::<OrderEvent>(value.value())?);
            }
        }
        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    // ========== Partner Events ==========

    pub fn store_partner_event(
        &self,
        txn: &WriteTransaction,
        event: &PartnerEvent,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PARTNER_EVENTS_TABLE)?;
        let value = serde_json::to_vec(event)?;
        table.insert((event.partner_id.as_str(), event.sequence), value.as_slice())?;
        Ok(())
    }

    pub fn get_partner_events(&self, partner_id: &str) -> StorageResult<Vec<PartnerEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PARTNER_EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.range((partner_id, 0u64)..=(partner_id, u64::MAX))? {
            let (_key, value) = result?;
            events.push(serde_json::from_slice::<PartnerEvent>(value.value())?);
        }
        Ok(events)
    }

    /// Partner events as seen by an open write transaction
    pub fn get_partner_events_txn(
        &self,
        txn: &WriteTransaction,
        partner_id: &str,
    ) -> StorageResult<Vec<PartnerEvent>> {
        let table = txn.open_table(PARTNER_EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.range((partner_id, 0u64)..=(partner_id, u64::MAX))? {
            let (_key, value) = result?;
            events.push(serde_json::from_slice::<PartnerEvent>(value.value())?);
        }
        Ok(events)
    }

    // ========== Order Snapshots ==========

    pub fn store_order_snapshot(
        &self,
        txn: &WriteTransaction,
        snapshot: &OrderSnapshot,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_SNAPSHOTS_TABLE)?;
        let value = serde_json::to_vec(snapshot)?;
        table.insert(snapshot.order_id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn get_order_snapshot(&self, order_id: &str) -> StorageResult<Option<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_SNAPSHOTS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_order_snapshot_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<OrderSnapshot>> {
        let table = txn.open_table(ORDER_SNAPSHOTS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_all_order_snapshots(&self) -> StorageResult<Vec<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_SNAPSHOTS_TABLE)?;

        let mut snapshots = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            snapshots.push(serde_json::from_slice::<OrderSnapshot>(value.value())?);
        }
        Ok(snapshots)
    }

    // ========== Partner Snapshots ==========

    pub fn store_partner_snapshot(
        &self,
        txn: &WriteTransaction,
        snapshot: &PartnerSnapshot,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PARTNER_SNAPSHOTS_TABLE)?;
        let value = serde_json::to_vec(snapshot)?;
        table.insert(snapshot.partner_id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn get_partner_snapshot(&self, partner_id: &str) -> StorageResult<Option<PartnerSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PARTNER_SNAPSHOTS_TABLE)?;
        match table.get(partner_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_partner_snapshot_txn(
        &self,
        txn: &WriteTransaction,
        partner_id: &str,
    ) -> StorageResult<Option<PartnerSnapshot>> {
        let table = txn.open_table(PARTNER_SNAPSHOTS_TABLE)?;
        match table.get(partner_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_all_partner_snapshots(&self) -> StorageResult<Vec<PartnerSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PARTNER_SNAPSHOTS_TABLE)?;

        let mut snapshots = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            snapshots.push(serde_json::from_slice::<PartnerSnapshot>(value.value())?);
        }
        Ok(snapshots)
    }

    // ========== Payment References ==========

    pub fn put_payment_ref(
        &self,
        txn: &WriteTransaction,
        razorpay_order_id: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PAYMENT_REFS_TABLE)?;
        table.insert(razorpay_order_id, order_id)?;
        Ok(())
    }

    /// Resolve a gateway reference to the order it was issued for
    pub fn find_order_by_payment_ref(&self, razorpay_order_id: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENT_REFS_TABLE)?;
        Ok(table.get(razorpay_order_id)?.map(|guard| guard.value().to_string()))
    }

    pub fn payment_ref_exists_txn(
        &self,
        txn: &WriteTransaction,
        razorpay_order_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PAYMENT_REFS_TABLE)?;
        Ok(table.get(razorpay_order_id)?.is_some())
    }

    // ========== Unassigned Index ==========

    pub fn mark_unassigned(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(UNASSIGNED_ORDERS_TABLE)?;
        table.insert(order_id, ())?;
        Ok(())
    }

    pub fn clear_unassigned(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(UNASSIGNED_ORDERS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    pub fn get_unassigned_order_ids(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(UNASSIGNED_ORDERS_TABLE)?;

        let mut ids = Vec::new();
        for result in table.iter()? {
            let (key, _value) = result?;
            ids.push(key.value().to_string());
        }
        Ok(ids)
    }

    pub fn get_unassigned_orders(&self) -> StorageResult<Vec<OrderSnapshot>> {
        let mut snapshots = Vec::new();
        for order_id in self.get_unassigned_order_ids()? {
            if let Some(snapshot) = self.get_order_snapshot(&order_id)? {
                snapshots.push(snapshot);
            }
        }
        Ok(snapshots)
    }

    // ========== Statistics ==========

    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;

        let order_events = read_txn.open_table(ORDER_EVENTS_TABLE)?;
        let order_snapshots = read_txn.open_table(ORDER_SNAPSHOTS_TABLE)?;
        let partner_events = read_txn.open_table(PARTNER_EVENTS_TABLE)?;
        let partner_snapshots = read_txn.open_table(PARTNER_SNAPSHOTS_TABLE)?;
        let unassigned = read_txn.open_table(UNASSIGNED_ORDERS_TABLE)?;
        let commands = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        let seq_table = read_txn.open_table(SEQUENCE_TABLE)?;

        Ok(StorageStats {
            order_event_count: order_events.len()?,
            order_count: order_snapshots.len()?,
            partner_event_count: partner_events.len()?,
            partner_count: partner_snapshots.len()?,
            unassigned_count: unassigned.len()?,
            processed_command_count: commands.len()?,
            current_sequence: seq_table.get(SEQUENCE_KEY)?.map(|g| g.value()).unwrap_or(0),
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageStats {
    pub order_event_count: u64,
    pub order_count: u64,
    pub partner_event_count: u64,
    pub partner_count: u64,
    pub unassigned_count: u64,
    pub processed_command_count: u64,
    pub current_sequence: u64,
}
