//! Ticket endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{blocking, ApiError};
use crate::api::state::AppState;
use crate::board::parse_state;
use crate::types::Ticket;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub dni: String,
    #[serde(default)]
    pub items: String,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    pub turno: u64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStateRequest {
    pub turno: u64,
    pub estado: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateStateResponse {
    pub success: bool,
    pub message: String,
    pub ticket: Ticket,
}

#[derive(Debug, Default, Deserialize)]
pub struct CurrentOrdersParams {
    /// Rebuild the board cache from the store first
    #[serde(default)]
    pub refresh: bool,
}

/// POST /api/pedido
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let dni = req.dni.trim().to_string();
    if dni.is_empty() {
        return Err(ApiError::bad_request("missing field: dni"));
    }

    let board = state.board.clone();
    let ticket = blocking(move || board.create_ticket(&dni, &req.items)).await?;

    Ok(Json(CreateOrderResponse {
        success: true,
        turno: ticket.number,
        message: format!("Tu turno es el número {}", ticket.number),
    }))
}

/// POST /api/update-estado
pub async fn update_state(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateStateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_state = parse_state(&req.estado)?;

    let board = state.board.clone();
    let ticket = blocking(move || board.transition_ticket(req.turno, new_state)).await?;

    Ok(Json(UpdateStateResponse {
        success: true,
        message: format!("Turno {} actualizado a {}", ticket.number, ticket.state),
        ticket,
    }))
}

/// GET /api/current-orders
pub async fn current_orders(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CurrentOrdersParams>,
) -> Result<impl IntoResponse, ApiError> {
    let board = state.board.clone();
    let tickets = blocking(move || {
        if params.refresh {
            board.resync()?;
        }
        Ok::<_, crate::board::BoardError>(board.snapshot())
    })
    .await?;

    Ok(Json(tickets))
}
