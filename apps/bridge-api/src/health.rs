//! Health check endpoint for service monitoring.

use axum::{http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

/// Health status response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Current service health status.
    pub status: HealthState,

    /// Application version from Cargo.toml.
    pub version: String,

    /// Database connectivity status.
    pub database: String,

    /// Response timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Health state enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// All systems operational.
    Healthy,
    /// Critical dependency failed.
    Unhealthy,
}

/// Health check handler (`GET /health`).
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Service unhealthy", body = HealthResponse),
    )
)]
pub async fn health_handler(
    Extension(pool): Extension<PgPool>,
) -> (StatusCode, Json<HealthResponse>) {
    let (status, database) = match sqlx::query("SELECT 1").fetch_one(&pool).await {
        Ok(_) => (HealthState::Healthy, "connected".to_string()),
        Err(_) => (HealthState::Unhealthy, "disconnected".to_string()),
    };

    let http_status = match status {
        HealthState::Healthy => StatusCode::OK,
        HealthState::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        timestamp: Utc::now(),
    };

    (http_status, Json(response))
}
