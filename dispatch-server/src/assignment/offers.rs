//! Pending offer registry
//!
//! One open offer per order. Whoever removes the entry first owns the
//! outcome: the partner's response claims it, the acceptance timer withdraws
//! it. The loser sees nothing to remove, so a late accept is rejected and a
//! late timer leaves an accepted offer alone.

use parking_lot::Mutex;
use shared::order::OfferResponse;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

struct PendingOffer {
    partner_id: String,
    round: u32,
    reply: oneshot::Sender<OfferResponse>,
}

/// Exclusive right to answer an offer, obtained by [`OfferBook::claim`]
#[derive(Debug)]
pub struct OfferClaim {
    pub order_id: String,
    pub partner_id: String,
    pub round: u32,
    reply: oneshot::Sender<OfferResponse>,
}

impl OfferClaim {
    /// Hand the outcome to the matching loop waiting on the offer
    pub fn respond(self, response: OfferResponse) {
        if self.reply.send(response).is_err() {
            tracing::debug!(order_id = %self.order_id, "Matching loop gone before offer reply");
        }
    }
}

#[derive(Clone, Default)]
pub struct OfferBook {
    pending: Arc<Mutex<HashMap<String, PendingOffer>>>,
}

impl std::fmt::Debug for OfferBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfferBook")
            .field("open", &self.pending.lock().len())
            .finish()
    }
}

impl OfferBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an offer and return the channel its reply arrives on
    ///
    /// `None` if the partner already holds an open offer for another order;
    /// the check and the insert happen under one lock, so two matching loops
    /// never both reach the same partner. Replaces any offer still open for
    /// the order; its waiter sees the channel close.
    pub fn open(
        &self,
        order_id: &str,
        partner_id: &str,
        round: u32,
    ) -> Option<oneshot::Receiver<OfferResponse>> {
        let mut pending = self.pending.lock();
        let busy_elsewhere = pending
            .iter()
            .any(|(order, offer)| order != order_id && offer.partner_id == partner_id);
        if busy_elsewhere {
            return None;
        }

        let (tx, rx) = oneshot::channel();
        let previous = pending.insert(
            order_id.to_string(),
            PendingOffer {
                partner_id: partner_id.to_string(),
                round,
                reply: tx,
            },
        );
        drop(pending);
        if let Some(previous) = previous {
            tracing::warn!(
                order_id = %order_id,
                replaced_partner = %previous.partner_id,
                "Replacing an offer that was still open"
            );
        }
        Some(rx)
    }

    /// Take the offer for a partner's response
    ///
    /// `None` when the offer was never made to this partner, already
    /// answered or already expired.
    pub fn claim(&self, order_id: &str, partner_id: &str) -> Option<OfferClaim> {
        let mut pending = self.pending.lock();
        if pending.get(order_id)?.partner_id != partner_id {
            return None;
        }
        let offer = pending.remove(order_id)?;
        Some(OfferClaim {
            order_id: order_id.to_string(),
            partner_id: offer.partner_id,
            round: offer.round,
            reply: offer.reply,
        })
    }

    /// Remove the offer when its window closes; false if a response got there first
    pub fn withdraw(&self, order_id: &str, partner_id: &str) -> bool {
        let mut pending = self.pending.lock();
        match pending.get(order_id) {
            Some(offer) if offer.partner_id == partner_id => {
                pending.remove(order_id);
                true
            }
            _ => false,
        }
    }

    /// Drop any open offer for the order, waking its matching loop
    pub fn cancel(&self, order_id: &str) -> bool {
        self.pending.lock().remove(order_id).is_some()
    }

    /// Partner currently holds an open offer for some order
    pub fn has_offer_for(&self, partner_id: &str) -> bool {
        self.pending
            .lock()
            .values()
            .any(|offer| offer.partner_id == partner_id)
    }

    pub fn is_open(&self, order_id: &str) -> bool {
        self.pending.lock().contains_key(order_id)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
