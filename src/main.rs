// src/main.rs

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use sawt_backend::api::http::{health_check, liveness_check, readiness_check};
use sawt_backend::api::ws::ws_talk_handler;
use sawt_backend::config::CONFIG;
use sawt_backend::metrics::{init_metrics, metrics_handler};
use sawt_backend::state::AppState;
use tower_http::cors::{Any, CorsLayer};

/// Graceful shutdown signal handler for SIGTERM and Ctrl+C
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level = CONFIG
        .logging
        .level
        .parse::<Level>()
        .unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Initialize Prometheus metrics
    init_metrics();

    info!("Starting Sawt Backend");
    info!(
        "Models: {} (primary) / {} (fallback)",
        CONFIG.openai.model, CONFIG.gemini.model
    );

    // Fatal only when the synthesis engine client cannot be acquired.
    let app_state = Arc::new(AppState::new()?);

    // Build router with WebSocket, health, and metrics endpoints
    let app = Router::new()
        .route("/ws/talk", get(ws_talk_handler))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
        .route("/metrics", get(metrics_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state);

    let bind_address = CONFIG.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!("WebSocket server listening on ws://{}/ws/talk", bind_address);
    info!("Health endpoints: /health, /ready, /live");
    info!("Metrics endpoint: /metrics");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutting down gracefully...");

    Ok(())
}
