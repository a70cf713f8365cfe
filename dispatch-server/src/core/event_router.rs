//! Event router
//!
//! Decouples the ledger broadcast from the workers that react to it.
//!
//! ```text
//! OrdersManager (broadcast)
//!        │
//!        └── EventRouter
//!               ├── mpsc ──► AssignmentEngine (confirmed, cancelled, reset, manual assign)
//!               └── mpsc ──► EarningsWorker (delivered)
//! ```
//!
//! Both consumers move money or partners, so sends block until the worker
//! has room. A lagging router is logged; the workers recover missed events
//! on restart (`resume_pending`, `catch_up`).

use shared::order::{OrderEvent, OrderEventPayload, OrderStatus};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

pub struct EventChannels {
    pub assignment_rx: mpsc::Receiver<OrderEvent>,
    pub earnings_rx: mpsc::Receiver<OrderEvent>,
}

pub struct EventRouter {
    assignment_tx: mpsc::Sender<OrderEvent>,
    earnings_tx: mpsc::Sender<OrderEvent>,
}

/// The assignment engine starts, restarts or withdraws matching on these
fn is_assignment_event(event: &OrderEvent) -> bool {
    matches!(
        event.payload,
        OrderEventPayload::StatusChanged {
            to: OrderStatus::Confirmed | OrderStatus::Cancelled,
            ..
        } | OrderEventPayload::AssignmentReset { .. }
            | OrderEventPayload::PartnerAssigned { manual: true, .. }
    )
}

fn is_earnings_event(event: &OrderEvent) -> bool {
    matches!(
        event.payload,
        OrderEventPayload::StatusChanged {
            to: OrderStatus::Delivered,
            ..
        }
    )
}

impl EventRouter {
    pub fn new(buffer: usize) -> (Self, EventChannels) {
        let (assignment_tx, assignment_rx) = mpsc::channel(buffer);
        let (earnings_tx, earnings_rx) = mpsc::channel(buffer);

        let router = Self {
            assignment_tx,
            earnings_tx,
        };
        let channels = EventChannels {
            assignment_rx,
            earnings_rx,
        };

        (router, channels)
    }

    /// Route until the source closes or shutdown is signalled
    pub async fn run(self, mut source: broadcast::Receiver<OrderEvent>, shutdown: CancellationToken) {
        tracing::info!("Event router started");

        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Event router received shutdown signal");
                    break;
                }
                received = source.recv() => received,
            };

            match received {
                Ok(event) => self.dispatch(event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::error!(skipped = n, "Event router lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Source channel closed, event router stopping");
                    break;
                }
            }
        }
    }

    async fn dispatch(&self, event: OrderEvent) {
        if is_earnings_event(&event)
            && self.earnings_tx.send(event.clone()).await.is_err()
        {
            tracing::error!(order_id = %event.order_id, "Earnings channel closed, delivery not credited");
        }

        if is_assignment_event(&event) {
            let order_id = event.order_id.clone();
            if self.assignment_tx.send(event).await.is_err() {
                tracing::error!(order_id = %order_id, "Assignment channel closed, event dropped");
            }
        }
    }
}
