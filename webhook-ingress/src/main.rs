//! Storefront webhook server.
//!
//! Receives payment provider callbacks on `POST /webhook`, verifies their
//! signature and marks paid orders. Refuses to start without the provider
//! app secret.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;

use storefront::telemetry::init_tracing;
use storefront::web::router;
use storefront::{AppState, Config, InMemoryOrderStore, WebhookIngress};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("web_server_starting");

    // Load configuration; a missing secret stops the process here
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        signature_scheme = %config.signature_scheme,
        max_body_bytes = config.max_body_bytes,
        "config_loaded"
    );

    let orders = Arc::new(InMemoryOrderStore::new());
    let ingress = WebhookIngress::from_config(&config, orders);
    info!(signature_scheme = %ingress.scheme(), "webhook_ingress_ready");

    let app = router(AppState::new(ingress), config.max_body_bytes);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
