//! Persistence store
//!
//! The durable record of students, pending registrations and tickets:
//! - `Store`: the operations the rest of the server relies on
//! - `EventStore`: append-only JSONL log replayed into in-memory indexes
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//! ┌─────────┐    ┌──────────────────┐    ┌────────────┐
//! │ Request │───►│ append + fsync   │───►│ apply to   │
//! │         │    │ to events.jsonl  │    │ indexes    │
//! └─────────┘    └──────────────────┘    └────────────┘
//!
//! Read Path (Startup):
//! ┌───────────────┐    ┌─────────────────┐
//! │ Read log      │───►│ Replay events   │───► Ready!
//! └───────────────┘    └─────────────────┘
//! ```

mod state;
mod store;

pub use store::{EventStore, EventStoreConfig, StoreError, StoreResult};

use crate::types::{PendingUser, Student, Ticket, TicketState};

/// Durable storage used by the board, identity service and CSV import
///
/// Implementations must provide read-your-writes consistency for the
/// calling process and must leave their state unchanged when a write fails.
pub trait Store: Send + Sync {
    // Students
    fn find_student(&self, dni: &str) -> StoreResult<Option<Student>>;
    fn upsert_student(&self, student: &Student) -> StoreResult<()>;

    // Pending registrations
    fn find_pending_by_dni(&self, dni: &str) -> StoreResult<Option<PendingUser>>;
    fn find_pending_by_token(&self, token: &str) -> StoreResult<Option<PendingUser>>;
    /// Fails with `DuplicateRegistration` if the DNI is a student or already pending
    fn insert_pending(&self, pending: &PendingUser) -> StoreResult<()>;
    /// Remove and return the pending registration, `None` if the token is unknown
    fn remove_pending(&self, token: &str) -> StoreResult<Option<PendingUser>>;

    // Tickets
    fn get_ticket(&self, number: u64) -> StoreResult<Option<Ticket>>;
    /// The owner's QUEUED or READY ticket, if any
    fn active_ticket_for(&self, owner: &str) -> StoreResult<Option<Ticket>>;
    /// Highest number ever issued, collected tickets included
    fn max_ticket_number(&self) -> StoreResult<u64>;
    /// Persist a new ticket; fails with `DuplicateTicket` if the number exists
    fn insert_ticket(&self, ticket: &Ticket) -> StoreResult<Ticket>;
    /// `None` if the ticket does not exist
    fn update_ticket_state(&self, number: u64, state: TicketState) -> StoreResult<Option<Ticket>>;
    /// All non-COLLECTED tickets ordered by number
    fn active_tickets(&self) -> StoreResult<Vec<Ticket>>;
}
