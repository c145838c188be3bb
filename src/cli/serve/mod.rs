//! Serve command - HTTP and WebSocket server with graceful shutdown

use std::net::SocketAddr;

use anyhow::{Context, bail};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::api::create_router;
use crate::config::AppConfig;
use crate::infrastructure::observability::{create_metrics_router, init_metrics};

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let state = crate::create_app_state(&config).await?;
    let cache = state.cache.clone();
    let fatal = state.shutdown.clone();

    let metrics = init_metrics(&config.metrics)
        .map(|handle| create_metrics_router(handle, &config.metrics.path));
    let app = create_router(state, &config.server, metrics);

    let addr = build_socket_addr(&config)?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Semantic search gateway listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_requested(fatal.clone()))
        .await?;

    if let Err(e) = cache.persist().await {
        error!(error = %e, "Final cache persist failed");
    }

    info!(entries = cache.len(), "Server shutdown complete");

    if fatal.is_cancelled() {
        bail!("Server stopped on a configuration fault; check the embedding model and dimension");
    }
    Ok(())
}

/// Resolves on an OS signal or when a fatal fault cancels `fatal`
async fn shutdown_requested(fatal: CancellationToken) {
    tokio::select! {
        _ = shutdown_signal() => {}
        _ = fatal.cancelled() => {
            error!("Fatal configuration fault, initiating graceful shutdown");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    let ip = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid server host '{}'", config.server.host))?;

    Ok(SocketAddr::from((ip, config.server.port)))
}
