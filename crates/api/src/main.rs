use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loadwatch_api::config::ServerConfig;
use loadwatch_api::monitor::{self, provider::SystemLoadProvider};
use loadwatch_api::router::build_app_router;
use loadwatch_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loadwatch_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Monitor tasks ---
    let cancel = CancellationToken::new();
    let provider = Arc::new(SystemLoadProvider::new());
    let (joins, handles) = monitor::start(
        provider,
        Duration::from_secs(config.sample_interval_secs),
        cancel.clone(),
    );
    tracing::info!("Monitor tasks started (sampler, alert detector, coordinator)");

    // --- App state / router ---
    let state = AppState {
        config: Arc::new(config.clone()),
        joins,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    // Connection info is required: the remote address is the subscriber
    // identity.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(cancel.clone()))
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();

    let sampler_result = tokio::time::timeout(Duration::from_secs(5), handles.sampler).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), handles.detector).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), handles.coordinator).await;
    tracing::info!("Monitor tasks shut down");

    // A sampler that died on a provider failure invalidates the service's
    // reason for existing; surface it in the exit code.
    if let Ok(Ok(Err(e))) = sampler_result {
        tracing::error!(error = %e, "Sampler terminated fatally");
        std::process::exit(1);
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal or internal cancellation to initiate
/// graceful shutdown.
///
/// Handles SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server shuts down
/// cleanly whether stopped interactively or by a process manager. The
/// cancellation token fires when a monitor task hits a fatal error, so a
/// dead metric source also stops the server.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
        () = cancel.cancelled() => {
            tracing::info!("Internal shutdown requested");
        }
    }
}
