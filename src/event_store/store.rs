//! Event Store - durable JSONL log with in-memory indexes
//!
//! Writes are appended and synced to disk before the indexes change, so a
//! failed write leaves the visible state exactly as it was.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

use super::state::StoreState;
use super::Store;
use crate::types::{
    Event, EventData, PendingRemovedData, PendingUser, Student, Ticket, TicketState,
    TicketStateChangedData,
};
use crate::utils::current_timestamp;

/// Configuration for the EventStore
#[derive(Debug, Clone)]
pub struct EventStoreConfig {
    /// Path to the data directory
    pub data_dir: PathBuf,
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl EventStoreConfig {
    /// Create config with custom data directory
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get path to events.jsonl
    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join("events.jsonl")
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DNI {0} is already registered or pending approval")]
    DuplicateRegistration(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ticket number {0} already issued")]
    DuplicateTicket(u64),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

struct Inner {
    state: StoreState,
    next_event_id: u64,
}

/// The EventStore owns the append-only log and the state replayed from it
pub struct EventStore {
    /// `None` keeps everything in memory
    config: Option<EventStoreConfig>,
    inner: Mutex<Inner>,
}

impl EventStore {
    /// Open (or create) the log under `config.data_dir` and replay it
    pub fn open(config: EventStoreConfig) -> StoreResult<Self> {
        std::fs::create_dir_all(config.data_dir())?;

        let events = load_events(&config.events_path())?;
        let mut state = StoreState::default();
        let mut max_event_id = 0u64;

        for event in &events {
            max_event_id = max_event_id.max(event.event_id);
            match event.typed_data() {
                Ok(data) => state.apply(data),
                Err(e) => {
                    tracing::warn!(event_id = event.event_id, error = %e, "Skipping malformed event payload");
                }
            }
        }

        tracing::info!(
            events = events.len(),
            students = state.students.len(),
            tickets = state.tickets.len(),
            path = %config.events_path().display(),
            "Event log replayed"
        );

        Ok(Self {
            config: Some(config),
            inner: Mutex::new(Inner {
                state,
                next_event_id: max_event_id + 1,
            }),
        })
    }

    /// A store with the same semantics but no file behind it
    pub fn in_memory() -> Self {
        Self {
            config: None,
            inner: Mutex::new(Inner {
                state: StoreState::default(),
                next_event_id: 1,
            }),
        }
    }

    /// Get the configuration (`None` for in-memory stores)
    pub fn config(&self) -> Option<&EventStoreConfig> {
        self.config.as_ref()
    }

    /// Get the next event ID (without incrementing)
    pub fn next_event_id(&self) -> u64 {
        self.inner.lock().next_event_id
    }

    /// Persist an event, then apply it to the indexes
    fn commit(&self, inner: &mut Inner, data: EventData) -> StoreResult<()> {
        let event = Event::new(inner.next_event_id, &data)?;

        if let Some(config) = &self.config {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(config.events_path())?;

            append_line(&mut file, &event.to_json_line()?, File::sync_all)?;
        }

        inner.next_event_id += 1;
        inner.state.apply(data);
        Ok(())
    }
}

/// Append one line and sync it, or leave the file as it was
///
/// On any failure the file is truncated back to its previous length so a
/// rejected event never reappears on replay.
fn append_line<S>(file: &mut File, line: &str, sync: S) -> StoreResult<()>
where
    S: Fn(&File) -> std::io::Result<()>,
{
    let len = file.metadata()?.len();

    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');

    let result = file.write_all(buf.as_bytes()).and_then(|()| sync(&*file));
    if let Err(e) = result {
        if let Err(rollback) = file.set_len(len).and_then(|()| file.sync_all()) {
            tracing::error!(error = %rollback, "Failed to roll back event log");
        }
        return Err(e.into());
    }
    Ok(())
}

/// Load all events from a log file, skipping lines that do not parse
fn load_events(path: &Path) -> StoreResult<Vec<Event>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match Event::from_json_line(&line) {
            Ok(event) => events.push(event),
            Err(e) => {
                tracing::warn!(line = line_num + 1, error = %e, "Failed to parse event");
            }
        }
    }

    Ok(events)
}

impl Store for EventStore {
    fn find_student(&self, dni: &str) -> StoreResult<Option<Student>> {
        Ok(self.inner.lock().state.students.get(dni).cloned())
    }

    fn upsert_student(&self, student: &Student) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, EventData::StudentUpserted(student.clone()))
    }

    fn find_pending_by_dni(&self, dni: &str) -> StoreResult<Option<PendingUser>> {
        Ok(self.inner.lock().state.pending_by_dni(dni).cloned())
    }

    fn find_pending_by_token(&self, token: &str) -> StoreResult<Option<PendingUser>> {
        Ok(self.inner.lock().state.pending.get(token).cloned())
    }

    fn insert_pending(&self, pending: &PendingUser) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        if inner.state.students.contains_key(&pending.dni)
            || inner.state.pending_by_dni(&pending.dni).is_some()
        {
            return Err(StoreError::DuplicateRegistration(pending.dni.clone()));
        }
        self.commit(&mut inner, EventData::PendingRegistered(pending.clone()))
    }

    fn remove_pending(&self, token: &str) -> StoreResult<Option<PendingUser>> {
        let mut inner = self.inner.lock();
        let Some(pending) = inner.state.pending.get(token).cloned() else {
            return Ok(None);
        };

        self.commit(
            &mut inner,
            EventData::PendingRemoved(PendingRemovedData {
                token: token.to_string(),
            }),
        )?;
        Ok(Some(pending))
    }

    fn get_ticket(&self, number: u64) -> StoreResult<Option<Ticket>> {
        Ok(self.inner.lock().state.tickets.get(&number).cloned())
    }

    fn active_ticket_for(&self, owner: &str) -> StoreResult<Option<Ticket>> {
        Ok(self.inner.lock().state.active_ticket_for(owner).cloned())
    }

    fn max_ticket_number(&self) -> StoreResult<u64> {
        Ok(self.inner.lock().state.max_ticket_number())
    }

    fn insert_ticket(&self, ticket: &Ticket) -> StoreResult<Ticket> {
        let mut inner = self.inner.lock();
        if inner.state.tickets.contains_key(&ticket.number) {
            return Err(StoreError::DuplicateTicket(ticket.number));
        }

        let now = current_timestamp();
        let mut stored = ticket.clone();
        stored.created_at = now;
        stored.updated_at = now;

        self.commit(&mut inner, EventData::TicketCreated(stored.clone()))?;
        Ok(stored)
    }

    fn update_ticket_state(&self, number: u64, state: TicketState) -> StoreResult<Option<Ticket>> {
        let mut inner = self.inner.lock();
        if !inner.state.tickets.contains_key(&number) {
            return Ok(None);
        }

        self.commit(
            &mut inner,
            EventData::TicketStateChanged(TicketStateChangedData {
                number,
                state,
                updated_at: current_timestamp(),
            }),
        )?;
        Ok(inner.state.tickets.get(&number).cloned())
    }

    fn active_tickets(&self) -> StoreResult<Vec<Ticket>> {
        Ok(self
            .inner
            .lock()
            .state
            .tickets
            .values()
            .filter(|t| t.is_active())
            .cloned()
            .collect())
    }
}
