//! Identity Service - login, registration and admin review
//!
//! Registration is a two-step flow: a request is stored as a pending user
//! and the administrator receives accept/deny links. Accepting promotes the
//! pending user to a student; both outcomes remove the pending record.

use std::str::FromStr;
use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};
use serde::Deserialize;
use thiserror::Error;

use crate::event_store::{Store, StoreError};
use crate::notify::{dispatch, templates, Notifier};
use crate::types::{PendingUser, Student};
use crate::utils::current_timestamp;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("DNI {0} is already registered or pending approval")]
    AlreadyRegistered(String),

    #[error("registration request not found")]
    TokenNotFound,

    #[error("invalid review action: {0}")]
    InvalidAction(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Settings for registration links and hashing
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Base URL used to build review and login links
    pub public_url: String,
    /// Recipient of review requests; empty disables them
    pub admin_email: String,
    pub bcrypt_cost: u32,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            public_url: "http://localhost:3000".to_string(),
            admin_email: String::new(),
            bcrypt_cost: DEFAULT_COST,
        }
    }
}

/// Registration form as submitted by the applicant
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub dni: String,
    #[serde(rename = "nombre", alias = "firstName")]
    pub first_name: String,
    #[serde(rename = "apellido", alias = "lastName")]
    pub last_name: String,
    pub password: String,
    pub email: String,
}

/// Administrator decision on a pending registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Accept,
    Deny,
}

impl FromStr for ReviewAction {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(ReviewAction::Accept),
            "deny" => Ok(ReviewAction::Deny),
            other => Err(IdentityError::InvalidAction(other.to_string())),
        }
    }
}

/// Result of a review
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    Accepted(Student),
    Denied(PendingUser),
}

/// Credential checks and the registration workflow
pub struct IdentityService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    config: IdentityConfig,
}

impl IdentityService {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, config: IdentityConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Check a DNI/password pair
    pub fn login(&self, dni: &str, password: &str) -> Result<Student, IdentityError> {
        let student = self
            .store
            .find_student(dni)?
            .ok_or(IdentityError::InvalidCredentials)?;

        if verify(password, &student.password_hash).unwrap_or(false) {
            Ok(student)
        } else {
            Err(IdentityError::InvalidCredentials)
        }
    }

    /// Record a registration request and notify the administrator
    ///
    /// Must run inside a tokio runtime: notifications are spawned.
    pub fn register(&self, request: RegistrationRequest) -> Result<PendingUser, IdentityError> {
        let dni = required(&request.dni, "dni")?;
        let first_name = required(&request.first_name, "nombre")?;
        let last_name = required(&request.last_name, "apellido")?;
        let email = required(&request.email, "email")?;
        if request.password.is_empty() {
            return Err(IdentityError::MissingField("password"));
        }

        if self.store.find_student(&dni)?.is_some()
            || self.store.find_pending_by_dni(&dni)?.is_some()
        {
            return Err(IdentityError::AlreadyRegistered(dni));
        }

        let pending = PendingUser {
            dni,
            first_name,
            last_name,
            email,
            password_hash: hash(&request.password, self.config.bcrypt_cost)?,
            verification_token: uuid::Uuid::new_v4().to_string(),
            requested_at: current_timestamp(),
        };
        // The store re-checks under its own lock; a concurrent request for
        // the same DNI loses here.
        self.store.insert_pending(&pending).map_err(|e| match e {
            StoreError::DuplicateRegistration(dni) => IdentityError::AlreadyRegistered(dni),
            other => IdentityError::Store(other),
        })?;

        tracing::info!(dni = %pending.dni, "Registration request stored");

        if self.config.admin_email.is_empty() {
            tracing::warn!(dni = %pending.dni, "No admin email configured, review request not sent");
        } else {
            let base = self.config.public_url.trim_end_matches('/');
            let token = &pending.verification_token;
            let accept_link = format!("{base}/auth/review/{token}/accept");
            let deny_link = format!("{base}/auth/review/{token}/deny");

            dispatch(
                self.notifier.clone(),
                templates::review_request(&self.config.admin_email, &pending, &accept_link, &deny_link),
            );
        }
        dispatch(self.notifier.clone(), templates::registration_received(&pending));

        Ok(pending)
    }

    /// Accept or deny a pending registration
    ///
    /// Must run inside a tokio runtime: notifications are spawned.
    pub fn review(&self, token: &str, action: ReviewAction) -> Result<ReviewOutcome, IdentityError> {
        let pending = self
            .store
            .find_pending_by_token(token)?
            .ok_or(IdentityError::TokenNotFound)?;

        match action {
            ReviewAction::Accept => {
                let student = pending.clone().into_student();
                self.store.upsert_student(&student)?;
                self.store.remove_pending(token)?;

                let login_url = format!("{}/", self.config.public_url.trim_end_matches('/'));
                dispatch(
                    self.notifier.clone(),
                    templates::account_approved(&pending, &login_url),
                );

                tracing::info!(dni = %student.dni, "Registration accepted");
                Ok(ReviewOutcome::Accepted(student))
            }
            ReviewAction::Deny => {
                self.store.remove_pending(token)?;
                dispatch(self.notifier.clone(), templates::account_denied(&pending));

                tracing::info!(dni = %pending.dni, "Registration denied");
                Ok(ReviewOutcome::Denied(pending))
            }
        }
    }
}

/// Trimmed, non-empty value or `MissingField`
fn required(value: &str, field: &'static str) -> Result<String, IdentityError> {
    let value = value.trim();
    if value.is_empty() {
        Err(IdentityError::MissingField(field))
    } else {
        Ok(value.to_string())
    }
}
