//! In-memory indexes rebuilt from the event log

use std::collections::{BTreeMap, HashMap};

use crate::types::{EventData, PendingUser, Student, Ticket};

/// Materialized view of every event applied so far
#[derive(Debug, Default, Clone)]
pub(crate) struct StoreState {
    pub(crate) students: HashMap<String, Student>,
    /// Pending registrations keyed by verification token
    pub(crate) pending: HashMap<String, PendingUser>,
    /// Every ticket ever issued, collected ones included
    pub(crate) tickets: BTreeMap<u64, Ticket>,
}

impl StoreState {
    /// Apply a single event to the indexes
    ///
    /// Replaying the same creation twice is harmless; state changes for
    /// unknown tickets are skipped.
    pub(crate) fn apply(&mut self, data: EventData) {
        match data {
            EventData::StudentUpserted(student) => {
                self.students.insert(student.dni.clone(), student);
            }
            EventData::PendingRegistered(pending) => {
                self.pending
                    .insert(pending.verification_token.clone(), pending);
            }
            EventData::PendingRemoved(data) => {
                self.pending.remove(&data.token);
            }
            EventData::TicketCreated(ticket) => {
                self.tickets.entry(ticket.number).or_insert(ticket);
            }
            EventData::TicketStateChanged(data) => match self.tickets.get_mut(&data.number) {
                Some(ticket) => {
                    ticket.state = data.state;
                    ticket.updated_at = data.updated_at;
                }
                None => {
                    tracing::warn!(ticket = data.number, "State change for unknown ticket skipped");
                }
            },
        }
    }

    /// Highest ticket number ever issued (0 when none)
    pub(crate) fn max_ticket_number(&self) -> u64 {
        self.tickets.keys().next_back().copied().unwrap_or(0)
    }

    pub(crate) fn active_ticket_for(&self, owner: &str) -> Option<&Ticket> {
        self.tickets
            .values()
            .find(|t| t.owner == owner && t.is_active())
    }

    pub(crate) fn pending_by_dni(&self, dni: &str) -> Option<&PendingUser> {
        self.pending.values().find(|p| p.dni == dni)
    }
}
