//! Service entry point for fetchboard.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;
use fetchboard_core::config::{Settings, load_default_file_config};
use fetchboard_core::display::{BoardLogWriter, spawn_status_board};
use fetchboard_core::server::{self, AppState};
use fetchboard_core::{Coordinator, Downloader, HttpClient, Registry};
use indicatif::{MultiProgress, ProgressDrawTarget};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let loaded = load_default_file_config()?;
    let settings = Settings::resolve(&args.to_partial_config(), loaded.config.as_ref())
        .context("Invalid configuration")?;

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config file > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings.verbosity.filter_directive()));
    // Log lines go to stderr around the status board instead of through it
    let multi = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(BoardLogWriter::new(multi.clone()))
        .init();

    debug!(?args, ?settings, config_path = ?loaded.path, "configuration resolved");
    info!("Fetchboard starting");

    tokio::fs::create_dir_all(&settings.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create download directory '{}'",
                settings.output_dir.display()
            )
        })?;

    let client = HttpClient::with_timeouts(settings.connect_timeout_secs, settings.read_timeout_secs)
        .context("Failed to build HTTP client")?;
    let registry = Arc::new(Registry::new());
    let downloader = Arc::new(Downloader::new(client, settings.output_dir.clone()));
    let coordinator = Coordinator::new(Arc::clone(&registry), downloader);

    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", settings.bind))?;

    let (board, stop_board) = spawn_status_board(
        settings.display,
        multi,
        Arc::clone(&registry),
        settings.display_interval,
    );

    server::serve(listener, AppState::new(coordinator), shutdown_signal())
        .await
        .context("Server error")?;

    stop_board.store(true, Ordering::SeqCst);
    if let Some(handle) = board
        && let Err(e) = handle.await
    {
        warn!(error = %e, "status board task panicked");
    }

    info!(jobs = registry.len(), "Fetchboard stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM (Ctrl+C only on non-Unix platforms).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                _ => {
                    warn!("failed to install signal handlers, falling back to Ctrl+C");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("Received SIGINT, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    }
}
