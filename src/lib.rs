//! Ticket Board Server
//!
//! A live ticket queue for a canteen counter: students take a numbered
//! ticket, staff move it through QUEUED → READY → COLLECTED, and kiosk
//! screens follow the board over WebSocket.
//!
//! # Modules
//!
//! - `board`: the ticket board (live cache, numbering, viewer broadcast)
//! - `event_store`: `Store` trait and the JSONL event-sourced implementation
//! - `identity`: login, registration requests and admin review
//! - `import`: bulk student import from CSV
//! - `notify`: background email notifications
//! - `api`: axum router, REST handlers and the WebSocket endpoint
//! - `config`: environment configuration
//! - `types`: core data structures (Ticket, Student, events)
//! - `utils`: utility functions (timestamps)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ticket_board::{EventStore, TicketBoard, TicketState};
//!
//! let store = Arc::new(EventStore::in_memory());
//! let board = TicketBoard::new(store);
//! let ticket = board.create_ticket("12345678", "1 empanada").unwrap();
//! board.transition_ticket(ticket.number, TicketState::Ready).unwrap();
//! ```

pub mod api;
pub mod board;
pub mod config;
pub mod event_store;
pub mod identity;
pub mod import;
pub mod notify;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use board::{BoardError, BoardMessage, ErrorKind, TicketBoard};
pub use config::Config;
pub use event_store::{EventStore, EventStoreConfig, Store, StoreError};
pub use identity::{IdentityError, IdentityService};
pub use types::{PendingUser, Student, Ticket, TicketState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
