//! Application builder: wires router + middleware + state into an Axum app.

use std::future::Future;

use axum::Router;
use axum::middleware as axum_middleware;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use beacon_core::config::AppConfig;
use beacon_core::error::AppError;

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);

    build_router(state)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Runs the Beacon server until Ctrl+C or SIGTERM.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Beacon server listening on {}", addr);

    serve(listener, AppState::new(config), shutdown_signal()).await
}

/// Serves the app on `listener` until `signal` resolves.
///
/// When the signal fires the realtime engine is shut down first, so open
/// WebSocket sessions end and the HTTP server can drain.
pub async fn serve<F>(listener: TcpListener, state: AppState, signal: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let engine = state.realtime.clone();
    let app = build_app(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            if let Err(e) = engine.shutdown().await {
                tracing::error!(error = %e, "Realtime engine shutdown failed");
            }
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
