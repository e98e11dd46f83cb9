//! Viewer channel message types

use serde::{Deserialize, Serialize};

use crate::types::Ticket;

/// Why a snapshot is being sent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// First message on a new connection
    InitialState,
    /// Sent after every mutation and on explicit refresh
    Update,
}

/// Envelope pushed to viewers: always the full board, never a delta
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardMessage {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub data: Vec<Ticket>,
}

impl BoardMessage {
    pub fn initial_state(data: Vec<Ticket>) -> Self {
        Self {
            kind: MessageType::InitialState,
            data,
        }
    }

    pub fn update(data: Vec<Ticket>) -> Self {
        Self {
            kind: MessageType::Update,
            data,
        }
    }
}

/// Messages a viewer may send
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Ask for the current snapshot
    GetCurrentState,
    /// Heartbeat
    Ping,
}

impl ClientMessage {
    /// Parse a text frame
    ///
    /// Accepts the JSON form and, for older kiosk pages, any text that
    /// mentions `GET_CURRENT_STATE` or `get_turnos`.
    pub fn parse(text: &str) -> Option<Self> {
        if let Ok(msg) = serde_json::from_str::<ClientMessage>(text) {
            return Some(msg);
        }

        if text.contains("GET_CURRENT_STATE") || text.contains("get_turnos") {
            return Some(ClientMessage::GetCurrentState);
        }

        None
    }
}

/// Pong response message
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PongMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
}

impl Default for PongMessage {
    fn default() -> Self {
        Self {
            msg_type: "PONG".to_string(),
        }
    }
}
