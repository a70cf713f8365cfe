//! Delivery crediting
//!
//! Listens for delivered orders and credits the assigned partner with their
//! share of the delivery fee. The command id is derived from the order id, so
//! a replayed event or a catch-up sweep never credits an order twice.

use rust_decimal::Decimal;
use shared::command::{CommandPayload, LedgerCommand};
use shared::order::{Actor, OrderEvent, OrderEventPayload, OrderStatus};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::FeeSharePolicy;
use crate::orders::{ManagerError, ManagerResult, OrderError, OrdersManager};

/// Idempotency key for an order's delivery credit
pub fn credit_command_id(order_id: &str) -> String {
    format!("credit-{}", order_id)
}

#[derive(Debug, Clone)]
pub struct EarningsWorker {
    manager: OrdersManager,
    policy: FeeSharePolicy,
}

impl EarningsWorker {
    pub fn new(manager: OrdersManager, policy: FeeSharePolicy) -> Self {
        Self { manager, policy }
    }

    /// Credit the partner who delivered `order_id`; returns the amount
    pub fn credit_delivery(&self, order_id: &str) -> ManagerResult<Decimal> {
        let order = self
            .manager
            .get_order(order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        if order.status != OrderStatus::Delivered {
            return Err(ManagerError::Domain(OrderError::InvalidOperation(format!(
                "order {} is {}, not delivered",
                order_id, order.status
            ))));
        }
        let partner_id = order.delivery_partner_id.clone().ok_or_else(|| {
            ManagerError::Domain(OrderError::InvalidOperation(format!(
                "delivered order {} has no partner",
                order_id
            )))
        })?;

        let amount = self.policy.share(order.money.delivery_fee).ok_or_else(|| {
            ManagerError::Domain(OrderError::Validation(format!(
                "fee share of {} overflows for order {}",
                order.money.delivery_fee, order_id
            )))
        })?;
        let response = self.manager.execute(LedgerCommand::with_id(
            credit_command_id(order_id),
            Actor::system("earnings-worker"),
            CommandPayload::CreditDelivery {
                order_id: order_id.to_string(),
                partner_id: partner_id.clone(),
                amount,
            },
        ))?;

        if response.duplicate {
            tracing::debug!(order_id = %order_id, "Delivery already credited");
        } else {
            tracing::info!(
                order_id = %order_id,
                partner_id = %partner_id,
                amount = %amount,
                "Delivery credited"
            );
        }
        Ok(amount)
    }

    pub fn handle_event(&self, event: &OrderEvent) {
        if let OrderEventPayload::StatusChanged {
            to: OrderStatus::Delivered,
            ..
        } = &event.payload
            && let Err(e) = self.credit_delivery(&event.order_id)
        {
            tracing::error!(order_id = %event.order_id, error = %e, "Failed to credit delivery");
        }
    }

    /// Credit every delivered order; already credited ones are absorbed
    pub fn catch_up(&self) -> ManagerResult<usize> {
        let mut credited = 0;
        for order in self.manager.all_orders()? {
            if order.status == OrderStatus::Delivered {
                self.credit_delivery(&order.order_id)?;
                credited += 1;
            }
        }
        Ok(credited)
    }

    /// Worker loop fed by the event router
    pub async fn run(self, mut events: mpsc::Receiver<OrderEvent>, shutdown: CancellationToken) {
        tracing::info!(policy = %self.policy, "Earnings worker started");
        match self.catch_up() {
            Ok(count) => tracing::debug!(count, "Delivered orders reconciled"),
            Err(e) => tracing::error!(error = %e, "Earnings catch-up failed"),
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Earnings worker received shutdown signal");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(&event),
                    None => {
                        tracing::info!("Earnings channel closed, worker stopping");
                        break;
                    }
                }
            }
        }
    }
}
