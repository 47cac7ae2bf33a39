// imgbatch/src/http/mod.rs
//! JSON API over the same operations as the CLI. Requests reference files on
//! the server's filesystem; image work runs on the blocking thread pool.

use crate::config::Settings;
use crate::core::{ImageToolError, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::signal;

mod error;
mod handlers;

pub use error::AppError;
pub use handlers::SingleResponse;

#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
}

pub fn build_router(settings: Settings) -> Router {
    let body_limit = settings.server.max_body_size_mb * 1024 * 1024;
    let state = AppState {
        settings: Arc::new(settings),
    };

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/operations", get(handlers::list_operations))
        .route("/api/{operation}", post(handlers::process_single))
        .route("/api/batch/{operation}", post(handlers::process_batch))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub async fn serve(router: Router, listen: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ImageToolError::ProcessingError(format!("HTTP server error: {}", e)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
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
    log::info!("Shutting down");
}
