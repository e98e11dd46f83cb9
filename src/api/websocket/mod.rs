//! WebSocket endpoint for live board viewers
//!
//! Each connection registers as a board viewer at `/ws/turnos`:
//! - `INITIAL_STATE` with the full board on connect
//! - `UPDATE` with the full board after every change
//! - `{"type":"GET_CURRENT_STATE"}` from the client answers with `UPDATE`

pub mod handler;

pub use handler::ws_handler;
