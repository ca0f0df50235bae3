//! Nationhood Server: application entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use nationhood_core::catalog::StaticCatalog;
use nationhood_db::DbManager;
use nationhood_server::{AppState, Args, build_router};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_filter)),
        )
        .json()
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server terminated");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    info!(listen = %args.listen, "Starting Nationhood server...");

    let manager = DbManager::connect(&args.db_config()).await?;
    nationhood_db::run_migrations(manager.client()).await?;

    let catalog = Arc::new(StaticCatalog::default());
    info!(territories = catalog.len(), "Territory catalog loaded");

    let state = AppState::new(manager.client().clone(), catalog);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!(addr = %args.listen, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Nationhood server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
