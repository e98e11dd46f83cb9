//! Shared application state for HTTP and WebSocket handlers

use std::sync::Arc;

use crate::board::TicketBoard;
use crate::event_store::Store;
use crate::identity::IdentityService;

pub struct AppState {
    /// The live ticket board
    pub board: Arc<TicketBoard>,

    /// Login and registration workflow
    pub identity: Arc<IdentityService>,

    /// bcrypt cost for CSV imports
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(board: Arc<TicketBoard>, identity: Arc<IdentityService>, bcrypt_cost: u32) -> Self {
        Self {
            board,
            identity,
            bcrypt_cost,
        }
    }

    /// The store shared by the board and the identity service
    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(self.board.store())
    }
}
