// ============================
// inventory-backend-bin/src/main.rs
// ============================
//! Tokio / Axum entry-point for the inventory backend.
use anyhow::Result;
use clap::Parser;
use inventory_backend_lib::{config::Settings, router, AppState};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "inventory-backend", about = "Inventory API server")]
struct Args {
    /// Explicit config file (TOML); defaults to config.toml/yaml/json lookup
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::load_from(path.clone())?,
        None => Settings::load()?,
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| settings.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_addr = settings.bind_addr;
    let state = AppState::with_flat_file(settings);
    let app = router::create_router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    // the connection handle dies with the process; nothing else to tear down
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
