//! feedbackdesk-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables, then CLI overrides.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Wire the assistants against the data platform and the provider.
//! 4. Build the Axum router and start the HTTP server with graceful shutdown.

mod config;
mod error;
mod middleware;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use crate::config::Config;
use crate::state::AppState;

#[derive(Parser)]
#[command(
    name = "feedbackdesk-server",
    version,
    about = "Serverless functions behind the feedbackdesk assistants"
)]
struct Cli {
    /// Address to bind, overrides FEEDBACKDESK_BIND.
    #[arg(long)]
    bind: Option<String>,
    /// Tracing filter, overrides FEEDBACKDESK_LOG.
    #[arg(long)]
    log: Option<String>,
    /// Emit logs as newline-delimited JSON.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cli = Cli::parse();
    let mut cfg = Config::from_env();
    if let Some(bind) = cli.bind {
        cfg.bind_address = bind;
    }
    if let Some(log) = cli.log {
        cfg.log_level = log;
    }
    cfg.log_json |= cli.log_json;

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: FEEDBACKDESK_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "feedbackdesk-server starting");
    if cfg.service_key.is_none() {
        warn!("FEEDBACKDESK_SERVICE_KEY is not set; platform calls use the store key");
    }

    // ── 3. Shared application state ────────────────────────────────────────────
    let store_url = cfg.core.store_url.clone();
    let state = Arc::new(AppState::from_config(cfg.clone())?);
    info!(store_url = %store_url, "assistants ready");

    // ── 4. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("feedbackdesk-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c   => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
