//! WebSocket connection handler

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};

use crate::api::state::AppState;
use crate::board::{BoardMessage, ClientMessage, PongMessage, ViewerId};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual viewer connection
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    // INITIAL_STATE is already queued on the channel
    let (viewer, mut rx) = state.board.connect_viewer();

    loop {
        tokio::select! {
            // Board snapshots to client
            msg = rx.recv() => {
                match msg {
                    Some(msg) => {
                        if send_json(&mut socket, msg.as_ref()).await.is_err() {
                            break; // Client disconnected
                        }
                    }
                    None => {
                        // Evicted for lagging; the client reconnects for a fresh INITIAL_STATE
                        let _ = socket.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            // Handle client messages
            result = socket.recv() => {
                match result {
                    Some(Ok(msg)) => {
                        if !handle_client_message(msg, viewer, &state, &mut socket).await {
                            break; // Client requested close or error
                        }
                    }
                    Some(Err(e)) => {
                        tracing::debug!(viewer, error = %e, "WebSocket error");
                        break;
                    }
                    None => break, // Client disconnected
                }
            }
        }
    }

    state.board.disconnect_viewer(viewer);
}

async fn send_json(socket: &mut WebSocket, msg: &BoardMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json)).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize board message");
            Ok(())
        }
    }
}

/// Handle a message from the client
/// Returns false if the connection should be closed
async fn handle_client_message(
    msg: Message,
    viewer: ViewerId,
    state: &AppState,
    socket: &mut WebSocket,
) -> bool {
    match msg {
        Message::Text(text) => {
            match ClientMessage::parse(&text) {
                Some(ClientMessage::GetCurrentState) => {
                    // Answered through the viewer channel to keep ordering.
                    // Only the viewer lock is taken, never the cache lock.
                    state.board.refresh_viewer(viewer);
                }
                Some(ClientMessage::Ping) => {
                    if let Ok(json) = serde_json::to_string(&PongMessage::default()) {
                        let _ = socket.send(Message::Text(json)).await;
                    }
                }
                None => {
                    tracing::debug!(viewer, "Ignoring unrecognized viewer message");
                }
            }
            true
        }
        Message::Binary(_) => true, // Ignore binary messages
        Message::Ping(data) => {
            let _ = socket.send(Message::Pong(data)).await;
            true
        }
        Message::Pong(_) => true, // Ignore pong responses
        Message::Close(_) => false, // Client requested close
    }
}
