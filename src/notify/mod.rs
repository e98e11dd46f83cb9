//! Out-of-band notifications (account lifecycle emails)
//!
//! Delivery is best-effort and at-most-once: [`dispatch`] hands the message
//! to a background task, logs any failure, and never reports back to the
//! request that triggered it.

mod email;
pub mod templates;

pub use email::{EmailConfig, EmailNotifier};

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;

/// A rendered message ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}

/// Something that can deliver a notification
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Send in the background; failures are logged and swallowed
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: Notification) -> JoinHandle<()> {
    tokio::spawn(async move {
        match notifier.send(&notification).await {
            Ok(()) => {
                tracing::info!(to = %notification.to, subject = %notification.subject, "Notification sent");
            }
            Err(e) => {
                tracing::error!(
                    to = %notification.to,
                    subject = %notification.subject,
                    error = %e,
                    "Failed to send notification"
                );
            }
        }
    })
}

/// Writes notifications to the log instead of sending them
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            to = %notification.to,
            subject = %notification.subject,
            "Notification (log only)"
        );
        Ok(())
    }
}

/// Keeps every notification in memory; for tests and dry runs
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications delivered so far, oldest first
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().push(notification.clone());
        Ok(())
    }
}
