//! Scoreboard HTTP API server.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use clap::Parser;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use scoreboard_server::{AppState, Config, build_cors_layer, init_logging, router};

/// Scoreboard HTTP API server.
#[derive(Parser, Debug)]
#[command(name = "scoreboard-server")]
#[command(about = "HTTP API server for the scoreboard leaderboard")]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "scoreboard-server.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logging is configured from the same file, so nothing is logged before this
    let config = Config::from_file(&args.config)?;
    init_logging(&config.logging)?;

    let addr: SocketAddr = config.bind_addr().parse()?;
    let state = AppState::from_config(&config).await?;
    let app = build_app(&config, state.clone());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, backend = state.service().store().kind(), "scoreboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // No request can touch the store any more
    state.shutdown().await?;
    tracing::info!("store closed, exiting");

    Ok(())
}

/// API routes, then the optional web UI, wrapped in CORS and request tracing.
fn build_app(config: &Config, state: AppState) -> Router {
    let mut app = router(state);

    if let Some(static_path) = &config.server.static_path {
        tracing::info!(path = %static_path, "serving web UI");
        app = app.fallback_service(ServeDir::new(static_path));
    }

    tracing::info!(
        enabled = config.cors.enabled,
        origins = ?config.cors.allow_origins,
        "cross-origin policy"
    );

    app.layer(build_cors_layer(&config.cors))
        .layer(TraceLayer::new_for_http())
}

/// Resolves on Ctrl+C or SIGTERM. A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for Ctrl+C");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&str>();

    let received = tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
    };
    tracing::info!(signal = received, "draining connections");
}
