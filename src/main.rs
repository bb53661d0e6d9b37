mod config;
mod dataset;
mod error;
mod evaluation;
mod routes;
mod server;
mod state;

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use config::{AppConfig, CliArgs};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "answerbench=info,tower_http=info".into()),
        )
        .init();

    let args = CliArgs::parse();
    info!("Starting answerbench v{}", env!("CARGO_PKG_VERSION"));
    info!("Datasets dir: {:?}", args.datasets_dir);
    info!("Generate endpoint: {}", args.generate_url);
    info!("Score endpoint: {}", args.score_url);

    // Validate datasets dir
    if !args.datasets_dir.exists() {
        error!("Datasets directory does not exist: {:?}", args.datasets_dir);
        std::process::exit(1);
    }

    let config = AppConfig::from_args(args);
    let port = config.port;

    let state = Arc::new(AppState::new(config)?);

    // Build and start HTTP server
    let router = server::build_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("answerbench listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("answerbench shutting down");

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal");
}
