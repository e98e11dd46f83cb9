//! Event types for the append-only store log
//!
//! Every durable change is one immutable event. Replaying the log in order
//! rebuilds students, pending registrations and tickets.

use serde::{Deserialize, Serialize};

use super::{PendingUser, Student, Ticket, TicketState};

/// Event types that can occur in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A student was created or overwritten (registration approval, CSV import)
    StudentUpserted,
    /// A registration request was recorded
    PendingRegistered,
    /// A registration request was accepted or denied
    PendingRemoved,
    /// A ticket was issued
    TicketCreated,
    /// Staff moved a ticket to another state
    TicketStateChanged,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::StudentUpserted => write!(f, "student_upserted"),
            EventType::PendingRegistered => write!(f, "pending_registered"),
            EventType::PendingRemoved => write!(f, "pending_removed"),
            EventType::TicketCreated => write!(f, "ticket_created"),
            EventType::TicketStateChanged => write!(f, "ticket_state_changed"),
        }
    }
}

/// Data payload for PendingRemoved event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRemovedData {
    pub token: String,
}

/// Data payload for TicketStateChanged event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketStateChangedData {
    pub number: u64,
    pub state: TicketState,
    #[serde(default)]
    pub updated_at: u64,
}

/// Typed payload for each event type
#[derive(Debug, Clone)]
pub enum EventData {
    StudentUpserted(Student),
    PendingRegistered(PendingUser),
    PendingRemoved(PendingRemovedData),
    TicketCreated(Ticket),
    TicketStateChanged(TicketStateChangedData),
}

impl EventData {
    pub fn event_type(&self) -> EventType {
        match self {
            EventData::StudentUpserted(_) => EventType::StudentUpserted,
            EventData::PendingRegistered(_) => EventType::PendingRegistered,
            EventData::PendingRemoved(_) => EventType::PendingRemoved,
            EventData::TicketCreated(_) => EventType::TicketCreated,
            EventData::TicketStateChanged(_) => EventType::TicketStateChanged,
        }
    }

    fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            EventData::StudentUpserted(d) => serde_json::to_value(d),
            EventData::PendingRegistered(d) => serde_json::to_value(d),
            EventData::PendingRemoved(d) => serde_json::to_value(d),
            EventData::TicketCreated(d) => serde_json::to_value(d),
            EventData::TicketStateChanged(d) => serde_json::to_value(d),
        }
    }
}

/// An immutable event in the store log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "eventType")]
    pub event_type: EventType,

    /// Unique, auto-incrementing event ID
    #[serde(rename = "eventId")]
    pub event_id: u64,

    /// Unix timestamp when event occurred
    #[serde(rename = "ts")]
    pub timestamp: i64,

    /// Event-specific payload
    pub data: serde_json::Value,
}

impl Event {
    /// Build an event from a typed payload, stamped with the current time
    pub fn new(event_id: u64, data: &EventData) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_type: data.event_type(),
            event_id,
            timestamp: chrono::Utc::now().timestamp(),
            data: data.to_value()?,
        })
    }

    /// Decode the payload according to `event_type`
    pub fn typed_data(&self) -> Result<EventData, serde_json::Error> {
        let data = self.data.clone();
        Ok(match self.event_type {
            EventType::StudentUpserted => EventData::StudentUpserted(serde_json::from_value(data)?),
            EventType::PendingRegistered => {
                EventData::PendingRegistered(serde_json::from_value(data)?)
            }
            EventType::PendingRemoved => EventData::PendingRemoved(serde_json::from_value(data)?),
            EventType::TicketCreated => EventData::TicketCreated(serde_json::from_value(data)?),
            EventType::TicketStateChanged => {
                EventData::TicketStateChanged(serde_json::from_value(data)?)
            }
        })
    }

    /// Serialize event to JSON string (for JSONL)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize event from JSON string
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
