//! HTTP server setup with Axum

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::rest::{admin, auth, tickets};
use super::state::AppState;
use super::websocket::ws_handler;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // Kiosk screens and the student app are served from other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket endpoint
        .route("/ws/turnos", get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        // Accounts
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/review/:token/:action", get(auth::review))
        .route("/admin/import-alumnos", post(admin::import_alumnos))
        // Tickets
        .route("/api/pedido", post(tickets::create_order))
        .route("/api/update-estado", post(tickets::update_state))
        .route("/api/current-orders", get(tickets::current_orders))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
