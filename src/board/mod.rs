//! Ticket Board - live view of in-flight tickets
//!
//! The board keeps an in-memory cache of every QUEUED or READY ticket and
//! pushes the whole cache to connected viewers after each change.
//!
//! # Lifecycle
//!
//! Build it once per process with [`TicketBoard::open`], which fills the
//! cache from the store through [`TicketBoard::resync`]. After that the
//! cache only changes through the board's own operations.
//!
//! # Consistency
//!
//! The cache lock is held by every ticket-affecting call from validation
//! to broadcast, so ticket numbers are allocated by a single writer and
//! broadcasts go out in mutation order. The store is written first; the
//! cache is only touched after the write succeeded, and nothing is
//! broadcast for a failed call.
//!
//! Viewers live behind a second lock together with the last published
//! board. Connecting, refreshing and disconnecting only take that lock,
//! so they never wait on a store write. Lock order is cache, then viewers.

mod error;
mod messages;
mod viewers;

pub use error::{BoardError, BoardResult, ErrorKind};
pub use messages::{BoardMessage, ClientMessage, MessageType, PongMessage};
pub use viewers::{Delivery, ViewerId, ViewerReceiver, ViewerRegistry};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::event_store::Store;
use crate::types::{Ticket, TicketState};

/// Default per-viewer channel capacity
pub const DEFAULT_VIEWER_BUFFER: usize = 64;

/// Authoritative in-process owner of the live ticket cache
pub struct TicketBoard {
    store: Arc<dyn Store>,
    /// Non-COLLECTED tickets by number
    cache: Mutex<BTreeMap<u64, Ticket>>,
    viewers: Mutex<ViewerRegistry>,
    /// Number of UPDATE broadcasts sent so far
    broadcasts: AtomicU64,
}

impl TicketBoard {
    /// Create an empty board; call [`resync`](Self::resync) before serving
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_viewer_buffer(store, DEFAULT_VIEWER_BUFFER)
    }

    /// Create an empty board with a custom per-viewer channel capacity
    pub fn with_viewer_buffer(store: Arc<dyn Store>, viewer_buffer: usize) -> Self {
        Self {
            store,
            cache: Mutex::new(BTreeMap::new()),
            viewers: Mutex::new(ViewerRegistry::new(viewer_buffer)),
            broadcasts: AtomicU64::new(0),
        }
    }

    /// Create a board and populate it from the store
    pub fn open(store: Arc<dyn Store>, viewer_buffer: usize) -> BoardResult<Self> {
        let board = Self::with_viewer_buffer(store, viewer_buffer);
        board.resync()?;
        Ok(board)
    }

    /// The store this board writes through
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Issue a new QUEUED ticket to `owner`
    pub fn create_ticket(&self, owner: &str, payload: &str) -> BoardResult<Ticket> {
        let mut cache = self.cache.lock();

        let student = self
            .store
            .find_student(owner)?
            .ok_or_else(|| BoardError::OwnerNotFound(owner.to_string()))?;

        if let Some(active) = self.store.active_ticket_for(owner)? {
            return Err(BoardError::ActiveTicketExists {
                owner: owner.to_string(),
                number: active.number,
            });
        }

        // Allocation happens under the cache lock: no other create can
        // observe the same max before this one is persisted.
        let number = self.store.max_ticket_number()? + 1;
        let ticket = self.store.insert_ticket(&Ticket::queued(
            number,
            owner.to_string(),
            student.display_name(),
            payload.to_string(),
        ))?;

        cache.insert(ticket.number, ticket.clone());
        self.broadcast_locked(&cache);

        tracing::info!(ticket = ticket.number, owner = %owner, "Ticket created");
        Ok(ticket)
    }

    /// Move a ticket to `state`; COLLECTED removes it from the board
    ///
    /// Reopening a COLLECTED ticket is a conflict when its owner already
    /// holds another active ticket.
    pub fn transition_ticket(&self, number: u64, state: TicketState) -> BoardResult<Ticket> {
        let mut cache = self.cache.lock();

        let current = self
            .store
            .get_ticket(number)?
            .ok_or(BoardError::TicketNotFound(number))?;

        if state.is_active() && !current.is_active() {
            if let Some(active) = self.store.active_ticket_for(&current.owner)? {
                if active.number != number {
                    return Err(BoardError::ActiveTicketExists {
                        owner: current.owner,
                        number: active.number,
                    });
                }
            }
        }

        let ticket = self
            .store
            .update_ticket_state(number, state)?
            .ok_or(BoardError::TicketNotFound(number))?;

        if ticket.is_active() {
            cache.insert(number, ticket.clone());
        } else {
            cache.remove(&number);
        }
        self.broadcast_locked(&cache);

        tracing::info!(ticket = number, state = %state, "Ticket state updated");
        Ok(ticket)
    }

    /// Current cache contents ordered by ticket number
    pub fn snapshot(&self) -> Vec<Ticket> {
        self.cache.lock().values().cloned().collect()
    }

    /// Rebuild the cache from the store's non-COLLECTED tickets
    ///
    /// Viewers get one UPDATE if the rebuilt cache differs from the old one.
    pub fn resync(&self) -> BoardResult<()> {
        let mut cache = self.cache.lock();

        let rebuilt: BTreeMap<u64, Ticket> = self
            .store
            .active_tickets()?
            .into_iter()
            .map(|t| (t.number, t))
            .collect();

        let changed = rebuilt != *cache;
        *cache = rebuilt;
        if changed {
            tracing::warn!(tickets = cache.len(), "Board cache differed from store, resynced");
            self.broadcast_locked(&cache);
        } else {
            tracing::debug!(tickets = cache.len(), "Board cache in sync with store");
        }

        Ok(())
    }

    /// Register a viewer; its first message is INITIAL_STATE
    pub fn connect_viewer(&self) -> (ViewerId, ViewerReceiver) {
        self.viewers.lock().register()
    }

    /// Unregister a viewer
    pub fn disconnect_viewer(&self, id: ViewerId) {
        self.viewers.lock().remove(id);
    }

    /// Send the current board as UPDATE to a single viewer
    pub fn refresh_viewer(&self, id: ViewerId) -> Delivery {
        self.viewers.lock().refresh(id)
    }

    pub fn viewer_count(&self) -> usize {
        self.viewers.lock().len()
    }

    /// Total UPDATE broadcasts caused by mutations and resyncs
    pub fn broadcast_count(&self) -> u64 {
        self.broadcasts.load(Ordering::SeqCst)
    }

    /// Publish the full cache to every viewer (caller holds the cache lock)
    fn broadcast_locked(&self, cache: &BTreeMap<u64, Ticket>) {
        let tickets: Vec<Ticket> = cache.values().cloned().collect();
        let count = tickets.len();
        let delivered = self.viewers.lock().publish(tickets);
        let seq = self.broadcasts.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::debug!(
            broadcast = seq,
            tickets = count,
            delivered,
            "Board update broadcast"
        );
    }
}

/// Parse a requested state; unknown values are a conflict
pub fn parse_state(value: &str) -> BoardResult<TicketState> {
    value
        .parse::<TicketState>()
        .map_err(|_| BoardError::InvalidState(value.to_string()))
}
