//! Todo API
//!
//! Entry point for the todo application backend.

use std::net::SocketAddr;
use std::sync::Arc;
use todo_api::auth::{ClaimPolicy, HttpKeySetFetcher, TokenVerifier};
use todo_api::config::Config;
use todo_api::observability::metrics::init_metrics_recorder;
use todo_api::routes::{self, AppState};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Todo API");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        firebase_project_id = %config.firebase_project_id,
        jwt_clock_skew_seconds = config.jwt_clock_skew_seconds,
        key_fetch_timeout_seconds = config.key_fetch_timeout_seconds,
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics: {}", e);
        e
    })?;

    let fetcher = Arc::new(HttpKeySetFetcher::with_timeout(
        config.firebase_certs_url.clone(),
        config.key_fetch_timeout(),
    ));
    let policy = ClaimPolicy::new(config.firebase_project_id.clone())
        .with_clock_skew(config.jwt_clock_skew());
    let verifier = Arc::new(TokenVerifier::new(fetcher, policy));

    // Parse bind address
    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    let state = Arc::new(AppState { config, verifier });
    let app = routes::build_routes(state, metrics_handle);

    info!("Todo API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Todo API shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
