use crate::{create_router, AppState};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

/// Bind `addr` and serve the tutor until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("Invalid bind address: {}", addr))?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Fenrir tutor listening on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  http://{}/ - Tutor page", addr);
    info!("  POST http://{}/api/analyze - Analyze a solution", addr);
    info!("  GET  http://{}/api/result - Last result of the session", addr);
    info!("  GET  http://{}/api/debug - Configuration diagnostics", addr);
    info!("  GET  http://{}/health - Health check", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
