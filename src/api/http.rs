// src/api/http.rs
//
// Health check and readiness endpoints for load balancers and Kubernetes probes.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// Health check endpoint for load balancers.
///
/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            service: "sawt-backend",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// Readiness probe. The service is ready once state construction finished,
/// so this always answers 200 while the process is up.
///
/// GET /ready
pub async fn readiness_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Liveness probe.
///
/// GET /live
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
