//! edubot-server — HTTP API over the chat service.
//!
//! | route | handler |
//! |---|---|
//! | `GET /api/health` | liveness |
//! | `POST /api/chat` | generate + validate |
//! | `POST /api/search` | generate, no validation |
//! | `POST /api/explain` | explanation, marks topic as revisited |
//! | `POST /api/progress` | record a study session |
//! | `GET /api/progress/{student_id}` | full progress record |

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

use edubot_core::ChatService;

pub mod error;
pub mod routes;

use routes::{
    chat_handler, explain_handler, get_progress_handler, health_handler, record_progress_handler,
    search_handler,
};

/// Build the application router.
pub fn router(service: Arc<ChatService>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/search", post(search_handler))
        .route("/api/explain", post(explain_handler))
        .route("/api/progress", post(record_progress_handler))
        .route("/api/progress/{student_id}", get(get_progress_handler))
        .with_state(service)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, service: Arc<ChatService>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = listener.local_addr()?;
    info!("Server running on {address}");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shut down");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
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
