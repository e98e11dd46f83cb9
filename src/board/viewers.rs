//! Registry of connected viewers
//!
//! Each viewer owns a bounded channel. Sends never block: a closed channel
//! unregisters the viewer, and so does a full one. A full channel means the
//! viewer can no longer be guaranteed the latest board, so it is dropped;
//! its transport closes and the client reconnects to a fresh INITIAL_STATE.
//!
//! The registry keeps the last published board so viewers can be served
//! without touching the board's cache lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

use super::messages::BoardMessage;
use crate::types::Ticket;

/// Identifier handed out on connect
pub type ViewerId = u64;

/// Receiving half given to the transport
pub type ViewerReceiver = mpsc::Receiver<Arc<BoardMessage>>;

/// Outcome of a single send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Viewer stopped draining its channel and was unregistered
    Evicted,
    /// Viewer went away and was removed
    Closed,
}

/// Connected viewers keyed by id
#[derive(Debug)]
pub struct ViewerRegistry {
    viewers: HashMap<ViewerId, mpsc::Sender<Arc<BoardMessage>>>,
    next_id: ViewerId,
    buffer: usize,
    /// Last board handed to [`publish`](Self::publish)
    latest: Vec<Ticket>,
}

impl ViewerRegistry {
    /// Create a registry whose viewer channels hold up to `buffer` messages
    pub fn new(buffer: usize) -> Self {
        Self {
            viewers: HashMap::new(),
            next_id: 1,
            buffer: buffer.max(1),
            latest: Vec::new(),
        }
    }

    /// Register a new viewer; INITIAL_STATE with the latest board is queued
    pub fn register(&mut self) -> (ViewerId, ViewerReceiver) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = self.next_id;
        self.next_id += 1;
        self.viewers.insert(id, tx);

        tracing::info!(viewer = id, total_viewers = self.viewers.len(), "Viewer connected");

        let initial = Arc::new(BoardMessage::initial_state(self.latest.clone()));
        self.send_to(id, initial);
        (id, rx)
    }

    /// Unregister a viewer; returns false if it was already gone
    pub fn remove(&mut self, id: ViewerId) -> bool {
        let removed = self.viewers.remove(&id).is_some();
        if removed {
            tracing::info!(viewer = id, remaining_viewers = self.viewers.len(), "Viewer disconnected");
        }
        removed
    }

    /// Send the latest board as UPDATE to one viewer
    pub fn refresh(&mut self, id: ViewerId) -> Delivery {
        let msg = Arc::new(BoardMessage::update(self.latest.clone()));
        self.send_to(id, msg)
    }

    /// Store `tickets` as the latest board and push it to every viewer
    ///
    /// Returns how many viewers received it.
    pub fn publish(&mut self, tickets: Vec<Ticket>) -> usize {
        let msg = Arc::new(BoardMessage::update(tickets.clone()));
        self.latest = tickets;
        self.broadcast(&msg)
    }

    /// The board last published
    pub fn latest(&self) -> &[Ticket] {
        &self.latest
    }

    /// Send to one viewer. Unknown ids report `Closed`.
    pub fn send_to(&mut self, id: ViewerId, msg: Arc<BoardMessage>) -> Delivery {
        let Some(tx) = self.viewers.get(&id) else {
            return Delivery::Closed;
        };

        match tx.try_send(msg) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(viewer = id, "Viewer channel full, disconnecting viewer");
                self.remove(id);
                Delivery::Evicted
            }
            Err(TrySendError::Closed(_)) => {
                self.remove(id);
                Delivery::Closed
            }
        }
    }

    /// Send to every viewer; returns how many received it
    pub fn broadcast(&mut self, msg: &Arc<BoardMessage>) -> usize {
        let mut delivered = 0;
        let mut dropped = Vec::new();

        for (id, tx) in &self.viewers {
            match tx.try_send(Arc::clone(msg)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(viewer = id, "Viewer channel full, disconnecting viewer");
                    dropped.push(*id);
                }
                Err(TrySendError::Closed(_)) => dropped.push(*id),
            }
        }

        for id in dropped {
            self.remove(id);
        }

        delivered
    }

    pub fn len(&self) -> usize {
        self.viewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::MessageType;

    fn update() -> Arc<BoardMessage> {
        Arc::new(BoardMessage::update(Vec::new()))
    }

    fn ticket(number: u64) -> Ticket {
        Ticket::queued(number, format!("dni-{}", number), String::new(), String::new())
    }

    #[test]
    fn test_register_and_remove() {
        let mut registry = ViewerRegistry::new(4);
        let (a, _rx_a) = registry.register();
        let (b, _rx_b) = registry.register();

        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert!(registry.remove(a));
        assert!(!registry.remove(a));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_queues_latest_board() {
        let mut registry = ViewerRegistry::new(4);
        registry.publish(vec![ticket(1), ticket(2)]);

        let (_id, mut rx) = registry.register();
        let initial = rx.try_recv().unwrap();
        assert_eq!(initial.kind, MessageType::InitialState);
        assert_eq!(initial.data.len(), 2);
    }

    #[test]
    fn test_broadcast_prunes_closed_viewers() {
        let mut registry = ViewerRegistry::new(4);
        let (_a, mut rx_a) = registry.register();
        let (_b, rx_b) = registry.register();
        drop(rx_b);
        rx_a.try_recv().unwrap();

        assert_eq!(registry.broadcast(&update()), 1);
        assert_eq!(registry.len(), 1);
        assert!(rx_a.try_recv().is_ok());
    }

    #[test]
    fn test_full_channel_evicts_only_that_viewer() {
        let mut registry = ViewerRegistry::new(1);
        let (slow, mut rx_slow) = registry.register();
        let (_fast, mut rx_fast) = registry.register();
        rx_fast.try_recv().unwrap();

        // slow still holds its INITIAL_STATE
        assert_eq!(registry.publish(vec![ticket(1)]), 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(rx_fast.try_recv().unwrap().data.len(), 1);
        assert_eq!(registry.send_to(slow, update()), Delivery::Closed);

        // The evicted viewer drains what it had, then sees the channel end
        assert_eq!(rx_slow.try_recv().unwrap().kind, MessageType::InitialState);
        assert!(matches!(
            rx_slow.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_refresh_sends_latest() {
        let mut registry = ViewerRegistry::new(4);
        let (id, mut rx) = registry.register();
        rx.try_recv().unwrap();
        registry.publish(vec![ticket(3)]);
        rx.try_recv().unwrap();

        assert_eq!(registry.refresh(id), Delivery::Delivered);
        let msg = rx.try_recv().unwrap();
        assert_eq!(msg.kind, MessageType::Update);
        assert_eq!(msg.data[0].number, 3);
    }

    #[test]
    fn test_send_to_unknown_viewer() {
        let mut registry = ViewerRegistry::new(1);
        assert_eq!(registry.send_to(99, update()), Delivery::Closed);
    }
}
