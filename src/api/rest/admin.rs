//! Administrator endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use super::{blocking, ApiError};
use crate::api::state::AppState;
use crate::import::{import_students, ImportReport};

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub report: ImportReport,
}

/// POST /admin/import-alumnos with a raw `text/csv` body
pub async fn import_alumnos(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let is_csv = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().to_ascii_lowercase().starts_with("text/csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(ApiError::bad_request("CSV requerido."));
    }

    let store = state.store();
    let cost = state.bcrypt_cost;
    let report = blocking(move || import_students(store.as_ref(), &body, cost)).await?;

    Ok(Json(ImportResponse {
        success: true,
        message: format!(
            "{} alumnos importados, {} filas con error.",
            report.imported, report.failed
        ),
        report,
    }))
}
