//! Login, registration and admin review endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{blocking, ApiError};
use crate::api::state::AppState;
use crate::identity::{RegistrationRequest, ReviewAction, ReviewOutcome};
use crate::notify::templates;
use crate::types::StudentProfile;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub dni: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub student: StudentProfile,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = state.identity.clone();
    let student = blocking(move || identity.login(req.dni.trim(), &req.password)).await?;

    Ok(Json(LoginResponse {
        success: true,
        message: format!("Bienvenido, {}", student.display_name()),
        student: student.profile(),
    }))
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegistrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = state.identity.clone();
    let pending = blocking(move || identity.register(req)).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: format!(
            "Solicitud recibida para {}. Te avisaremos por email cuando sea revisada.",
            pending.dni
        ),
    }))
}

/// GET /auth/review/:token/:action
pub async fn review(
    State(state): State<Arc<AppState>>,
    Path((token, action)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let action: ReviewAction = action.parse()?;

    let identity = state.identity.clone();
    let outcome = blocking(move || identity.review(&token, action)).await?;

    let text = match outcome {
        ReviewOutcome::Accepted(student) => {
            format!("Registro de {} aprobado.", student.display_name())
        }
        ReviewOutcome::Denied(pending) => {
            format!("Registro de {} rechazado.", pending.display_name())
        }
    };

    Ok(Html(format!(
        "<!DOCTYPE html><html><body><p>{}</p></body></html>",
        templates::escape(&text)
    )))
}
