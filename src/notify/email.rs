//! Email delivery through a Resend-style HTTP API

use async_trait::async_trait;

use super::{Notification, Notifier, NotifyError};

/// Email configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Endpoint accepting `{from, to, subject, html}` as JSON
    pub api_url: String,
    /// Bearer key; empty disables sending
    pub api_key: String,
    /// From address for emails
    pub from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.resend.com/emails".to_string(),
            api_key: String::new(),
            from: "Buffet Turnos <noreply@localhost>".to_string(),
        }
    }
}

impl EmailConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("EMAIL_API_URL").unwrap_or(defaults.api_url),
            api_key: std::env::var("EMAIL_API_KEY").unwrap_or_default(),
            from: std::env::var("EMAIL_FROM").unwrap_or(defaults.from),
        }
    }

    /// Check if email sending is enabled
    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Sends notifications as emails
#[derive(Clone)]
pub struct EmailNotifier {
    config: EmailConfig,
    client: reqwest::Client,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if !self.config.is_enabled() {
            tracing::warn!(subject = %notification.subject, "Email not configured, skipping");
            return Ok(());
        }

        let body = serde_json::json!({
            "from": self.config.from,
            "to": [notification.to],
            "subject": notification.subject,
            "html": notification.html,
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_notifier_skips() {
        let notifier = EmailNotifier::new(EmailConfig::default());
        assert!(!notifier.is_enabled());

        let result = notifier
            .send(&Notification {
                to: "ana@example.com".to_string(),
                subject: "x".to_string(),
                html: String::new(),
            })
            .await;
        assert!(result.is_ok());
    }
}
