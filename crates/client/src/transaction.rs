//! Inventory click correlation.
//!
//! Every click gets a per-window transaction id. Until 1.16 the server
//! answers each click with an acknowledgement, and a rejected click must be
//! echoed back before the server accepts further clicks on that window.

use crate::error::{ClientError, Result};
use crate::inventory::InventoryManager;
use crate::outbox::Outbox;
use craftbot_protocol::{
    CloseWindowClientbound, ConfirmTransactionClientbound, ConfirmTransactionServerbound,
    ContainerClick, Message, MessageHandler, MessageKind,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A click waiting for its acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransaction {
    /// Window the click targeted.
    pub window_id: u8,
    /// Id stamped on the click.
    pub transaction_id: i16,
    /// The click as sent.
    pub action: ContainerClick,
    /// When the click was sent.
    pub issued_at: Instant,
}

/// Result of matching an acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The server applied the click.
    Accepted,
    /// The server refused the click.
    Rejected {
        /// Whether the apology reached the transport.
        apologized: bool,
    },
    /// No pending click matches.
    Unknown,
}

/// Assigns transaction ids and matches acknowledgements.
#[derive(Debug)]
pub struct TransactionTracker {
    inventory: Arc<InventoryManager>,
    outbox: Arc<Outbox>,
    pending: Mutex<BTreeMap<(u8, i16), PendingTransaction>>,
    acks_supported: bool,
}

impl TransactionTracker {
    /// Kinds this tracker listens to.
    pub const SUBSCRIPTIONS: &'static [MessageKind] = &[
        MessageKind::ConfirmTransactionClientbound,
        MessageKind::CloseWindowClientbound,
    ];

    /// Tracker sending through `outbox`, reading counters from `inventory`.
    pub fn new(inventory: Arc<InventoryManager>, outbox: Arc<Outbox>) -> Self {
        let acks_supported = outbox.codec().version().has_transaction_acks();
        Self {
            inventory,
            outbox,
            pending: Mutex::new(BTreeMap::new()),
            acks_supported,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<(u8, i16), PendingTransaction>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stamp `action` with the window's next id, record it and send it.
    ///
    /// Concurrent calls are serialised, so ids on one window are distinct
    /// and follow the counter. If the send fails the entry is dropped and
    /// the id stays consumed. When the counter has wrapped onto an id that is
    /// still pending, nothing is sent and the counter does not move.
    pub fn begin_transaction(&self, window_id: u8, mut action: ContainerClick) -> Result<i16> {
        let mut pending = self.lock();
        let reserved = self
            .inventory
            .reserve_transaction_id_if(window_id, |candidate| {
                !pending.contains_key(&(window_id, candidate))
            })
            .ok_or(ClientError::UnknownWindow(window_id))?;
        let transaction_id = match reserved {
            Ok(id) => id,
            Err(transaction_id) => {
                warn!(window = window_id, transaction_id, "next transaction id is still pending");
                return Err(ClientError::TransactionIdsExhausted {
                    window_id,
                    transaction_id,
                });
            }
        };

        action.window_id = window_id;
        action.action_number = self.acks_supported.then_some(transaction_id);

        let key = (window_id, transaction_id);
        if self.acks_supported {
            pending.insert(
                key,
                PendingTransaction {
                    window_id,
                    transaction_id,
                    action: action.clone(),
                    issued_at: Instant::now(),
                },
            );
        }

        if let Err(err) = self.outbox.send(&Message::ContainerClick(action)) {
            pending.remove(&key);
            return Err(err);
        }
        debug!(window = window_id, transaction_id, "transaction sent");
        Ok(transaction_id)
    }

    /// Match a server acknowledgement.
    ///
    /// A rejection sends the apology echoing the window, the id and the flag.
    /// If the transport is gone the apology is skipped with a warning.
    pub fn acknowledge(&self, window_id: u8, transaction_id: i16, accepted: bool) -> AckOutcome {
        let removed = self.lock().remove(&(window_id, transaction_id));
        if removed.is_none() {
            warn!(window = window_id, transaction_id, accepted, "acknowledgement for unknown transaction");
            return AckOutcome::Unknown;
        }
        if accepted {
            debug!(window = window_id, transaction_id, "transaction accepted");
            return AckOutcome::Accepted;
        }

        let apology = Message::ConfirmTransactionServerbound(ConfirmTransactionServerbound {
            window_id: window_id as i8,
            action_number: transaction_id,
            accepted,
        });
        let apologized = match self.outbox.send(&apology) {
            Ok(()) => true,
            Err(err) => {
                warn!(window = window_id, transaction_id, error = %err, "could not send apology");
                false
            }
        };
        debug!(window = window_id, transaction_id, apologized, "transaction rejected");
        AckOutcome::Rejected { apologized }
    }

    /// Forget every pending click on `window_id`.
    pub fn drop_window(&self, window_id: u8) -> usize {
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|(window, _), _| *window != window_id);
        before - pending.len()
    }

    /// Forget clicks pending for longer than `max_age`.
    pub fn expire_older_than(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|_, entry| now.saturating_duration_since(entry.issued_at) <= max_age);
        let expired = before - pending.len();
        if expired > 0 {
            warn!(expired, "pending transactions expired without acknowledgement");
        }
        expired
    }

    /// Number of clicks waiting for an acknowledgement.
    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    /// Snapshot of one pending click.
    pub fn pending(&self, window_id: u8, transaction_id: i16) -> Option<PendingTransaction> {
        self.lock().get(&(window_id, transaction_id)).cloned()
    }
}

impl MessageHandler for TransactionTracker {
    fn on_confirm_transaction_clientbound(&self, msg: &ConfirmTransactionClientbound) {
        self.acknowledge(msg.window_id as u8, msg.action_number, msg.accepted);
    }

    fn on_close_window_clientbound(&self, msg: &CloseWindowClientbound) {
        let dropped = self.drop_window(msg.window_id);
        if dropped > 0 {
            debug!(window = msg.window_id, dropped, "dropped pending transactions");
        }
    }
}
