//! Queue ticket types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::is_zero;

/// Lifecycle state of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketState {
    /// Waiting in line
    #[serde(alias = "EN_COLA")]
    Queued,
    /// Order prepared, owner should come to the counter
    #[serde(alias = "LISTO")]
    Ready,
    /// Handed over; terminal
    #[serde(alias = "RETIRADO")]
    Collected,
}

impl TicketState {
    /// Queued and ready tickets are the ones shown on the board
    pub fn is_active(self) -> bool {
        !matches!(self, TicketState::Collected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TicketState::Queued => "QUEUED",
            TicketState::Ready => "READY",
            TicketState::Collected => "COLLECTED",
        }
    }
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a state string names no known state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownState(pub String);

impl fmt::Display for UnknownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown ticket state: {}", self.0)
    }
}

impl std::error::Error for UnknownState {}

impl FromStr for TicketState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QUEUED" | "EN_COLA" => Ok(TicketState::Queued),
            "READY" | "LISTO" => Ok(TicketState::Ready),
            "COLLECTED" | "RETIRADO" => Ok(TicketState::Collected),
            _ => Err(UnknownState(s.to_string())),
        }
    }
}

/// A single queue entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "ticketNumber")]
    pub number: u64,
    #[serde(rename = "ownerIdentifier")]
    pub owner: String,
    /// "First Last" of the owner, captured when the ticket was issued
    #[serde(rename = "ownerName", default)]
    pub owner_name: String,
    pub state: TicketState,
    /// Order contents as typed by the student
    #[serde(default)]
    pub payload: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "is_zero")]
    pub created_at: u64,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "is_zero")]
    pub updated_at: u64,
}

impl Ticket {
    /// Create a freshly queued ticket
    pub fn queued(number: u64, owner: String, owner_name: String, payload: String) -> Self {
        Self {
            number,
            owner,
            owner_name,
            state: TicketState::Queued,
            payload,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}
