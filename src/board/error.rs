//! Board errors

use thiserror::Error;

use crate::event_store::StoreError;

/// Result type for board operations
pub type BoardResult<T> = Result<T, BoardError>;

/// Coarse classification used by callers to pick a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown owner or ticket number
    NotFound,
    /// Owner already holds an active ticket, or the requested state is invalid
    Conflict,
    /// The durable store call failed; nothing was applied
    PersistenceFailure,
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("owner {0} is not a registered student")]
    OwnerNotFound(String),

    #[error("ticket #{0} not found")]
    TicketNotFound(u64),

    #[error("owner {owner} already holds active ticket #{number}")]
    ActiveTicketExists { owner: String, number: u64 },

    #[error("invalid ticket state: {0}")]
    InvalidState(String),

    #[error("persistence failure: {0}")]
    Store(#[from] StoreError),
}

impl BoardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BoardError::OwnerNotFound(_) | BoardError::TicketNotFound(_) => ErrorKind::NotFound,
            BoardError::ActiveTicketExists { .. } | BoardError::InvalidState(_) => {
                ErrorKind::Conflict
            }
            BoardError::Store(_) => ErrorKind::PersistenceFailure,
        }
    }
}
