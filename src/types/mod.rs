//! Data types for the ticket board server
//!
//! Tickets, students, pending registrations and the store event log.

mod event;
mod ticket;
mod user;

pub use event::{Event, EventData, EventType, PendingRemovedData, TicketStateChangedData};
pub use ticket::{Ticket, TicketState, UnknownState};
pub use user::{PendingUser, Student, StudentProfile};

/// Check if value is zero (for skip_serializing_if)
pub fn is_zero(val: &u64) -> bool {
    *val == 0
}
