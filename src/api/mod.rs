//! HTTP and WebSocket API
//!
//! - `rest`: JSON endpoints for tickets, accounts and imports
//! - `websocket`: live board viewers at `/ws/turnos`

pub mod http;
pub mod rest;
pub mod state;
pub mod websocket;

pub use http::create_router;
pub use rest::ApiError;
pub use state::AppState;
