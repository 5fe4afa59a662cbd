//! Correlation registry control loop.
//!
//! # Responsibilities
//! - Own the table mapping reply ids to the waiters blocked on them
//! - Apply register-wait and deliver strictly in mailbox order
//! - Fan a delivery out to every waiter of an id, then forget the id
//!
//! # Design Decisions
//! - The table lives inside one task; everything else talks to it through
//!   a [`RegistryHandle`], so no lock guards it
//! - A deliver for an id with no entry is dropped. A register-wait that
//!   arrives after that delivery stays pending until another deliver for
//!   the same id (normally its own expiry timer)
//! - Timer and real completion go through the same mailbox, so whichever
//!   is dequeued first wins and the other finds no entry. Only an expiry
//!   that finds an entry counts as a timeout

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};

use crate::correlation::types::{PendingResponse, RegistryStats, ReplyId, Waiter};
use crate::observability::metrics;

/// Messages accepted by the control loop.
#[derive(Debug)]
pub enum Command {
    /// Append a waiter to the list for `id`.
    Register { id: ReplyId, waiter: Waiter },
    /// Send `response` to every waiter of `id`, then remove the entry.
    Deliver { id: ReplyId, response: PendingResponse },
    /// Deliver the synthetic 504 for `id` on behalf of its expiry timer.
    Expire { id: ReplyId },
    /// Report occupancy; answered in mailbox order.
    Stats { reply: oneshot::Sender<RegistryStats> },
}

/// Cloneable mailbox of the registry control loop.
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl RegistryHandle {
    /// Register a waiter for `id`. Never blocks.
    pub fn register_wait(&self, id: ReplyId, waiter: Waiter) {
        if self.tx.send(Command::Register { id, waiter }).is_err() {
            tracing::warn!("Correlation registry stopped, waiter discarded");
        }
    }

    /// Deliver `response` to whoever waits on `id`. Never blocks.
    pub fn deliver(&self, id: ReplyId, response: PendingResponse) {
        if self.tx.send(Command::Deliver { id, response }).is_err() {
            tracing::warn!("Correlation registry stopped, delivery discarded");
        }
    }

    /// Answer whoever still waits on `id` with the synthetic 504. Never blocks.
    pub fn expire(&self, id: ReplyId) {
        if self.tx.send(Command::Expire { id }).is_err() {
            tracing::warn!("Correlation registry stopped, expiry discarded");
        }
    }

    /// Create a waiter for `id`, register it and return its receiver.
    pub fn wait(&self, id: ReplyId) -> oneshot::Receiver<PendingResponse> {
        let (waiter, rx) = Waiter::new();
        self.register_wait(id, waiter);
        rx
    }

    /// Query occupancy. `None` if the loop has exited.
    pub async fn stats(&self) -> Option<RegistryStats> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Stats { reply }).ok()?;
        rx.await.ok()
    }
}

/// The registry control loop and the table it owns.
#[derive(Debug)]
pub struct Registry {
    rx: mpsc::UnboundedReceiver<Command>,
    table: HashMap<ReplyId, Vec<Waiter>>,
    delivered: u64,
    dropped: u64,
    timed_out: u64,
}

impl Registry {
    /// Create a registry and the handle used to reach it.
    pub fn new() -> (Self, RegistryHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = Self {
            rx,
            table: HashMap::new(),
            delivered: 0,
            dropped: 0,
            timed_out: 0,
        };
        (registry, RegistryHandle { tx })
    }

    /// Spawn the control loop on the current runtime.
    pub fn spawn() -> RegistryHandle {
        let (registry, handle) = Self::new();
        tokio::spawn(registry.run());
        handle
    }

    /// Process commands until every handle is dropped.
    pub async fn run(mut self) {
        tracing::debug!("Correlation registry started");
        while let Some(command) = self.rx.recv().await {
            self.apply(command);
        }
        tracing::debug!(
            pending_ids = self.table.len(),
            "Correlation registry stopped"
        );
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Register { id, waiter } => {
                tracing::trace!(reply_id = %id, "Waiter registered");
                self.table.entry(id).or_default().push(waiter);
            }
            Command::Deliver { id, response } => {
                self.deliver(id, response);
            }
            Command::Expire { id } => {
                if self.deliver(id, PendingResponse::gateway_timeout()) {
                    self.timed_out += 1;
                    metrics::record_timeout();
                }
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
        metrics::set_pending(self.table.len());
    }

    /// Fan `response` out to the waiters of `id`. `false` if there were none.
    fn deliver(&mut self, id: ReplyId, response: PendingResponse) -> bool {
        let Some(waiters) = self.table.remove(&id) else {
            self.dropped += 1;
            metrics::record_delivery(false);
            tracing::debug!(reply_id = %id, "No waiter for delivery, dropped");
            return false;
        };

        self.delivered += 1;
        metrics::record_delivery(true);
        let mut reached = 0usize;
        for waiter in waiters {
            if waiter.fulfill(response.clone()) {
                reached += 1;
            }
        }
        tracing::debug!(
            reply_id = %id,
            status = response.status.as_u16(),
            waiters = reached,
            "Response delivered"
        );
        true
    }

    fn stats(&self) -> RegistryStats {
        RegistryStats {
            pending_ids: self.table.len(),
            pending_waiters: self.table.values().map(Vec::len).sum(),
            delivered: self.delivered,
            dropped: self.dropped,
            timed_out: self.timed_out,
        }
    }
}
