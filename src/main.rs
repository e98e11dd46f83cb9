//! Ticket Board Server - Binary Entry Point
//!
//! This is the main entry point for the ticket-server binary.

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use ticket_board::api::{create_router, AppState};
use ticket_board::board::TicketBoard;
use ticket_board::config::Config;
use ticket_board::event_store::{EventStore, EventStoreConfig, Store};
use ticket_board::identity::IdentityService;
use ticket_board::notify::{EmailNotifier, LogNotifier, Notifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let store: Arc<dyn Store> = Arc::new(EventStore::open(EventStoreConfig::new(&config.data_dir))?);
    let board = Arc::new(TicketBoard::open(store.clone(), config.viewer_buffer)?);

    let notifier: Arc<dyn Notifier> = if config.email.is_enabled() {
        Arc::new(EmailNotifier::new(config.email.clone()))
    } else {
        tracing::warn!("EMAIL_API_KEY not set, notifications are only logged");
        Arc::new(LogNotifier)
    };

    let identity = Arc::new(IdentityService::new(store, notifier, config.identity()));
    let state = Arc::new(AppState::new(board.clone(), identity, config.bcrypt_cost));
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        addr = %addr,
        data_dir = %config.data_dir.display(),
        tickets = board.snapshot().len(),
        "Ticket board listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
