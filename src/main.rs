//! Beacon Server: real-time location broadcast hub
//!
//! Main entry point that loads configuration, installs logging and starts
//! the HTTP/WebSocket server.

use tracing_subscriber::{EnvFilter, fmt};

use beacon_core::config::AppConfig;
use beacon_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("BEACON_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Beacon v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        max_connections = config.realtime.max_connections,
        marker_sizing = ?config.realtime.marker_sizing,
        strict_coordinates = config.realtime.strict_coordinates,
        "Realtime settings"
    );

    beacon_api::run_server(config).await?;

    tracing::info!("Beacon server shut down gracefully");
    Ok(())
}
