use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use redraft_core::{AppConfig, RewriteAssistant};
use redraft_server::{build_router, logging, AppState};
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "redraft-server", version, about = "Redraft analysis and rewriting server")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(short, long)]
    listen: Option<String>,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logging(args.debug);

    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }
    let addr = config.listen_addr()?;

    let assistant = RewriteAssistant::from_config(&config)?;
    let app = build_router(AppState::new(assistant));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Redraft server listening: addr={}, version={}", addr, redraft_core::VERSION);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Redraft server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
