use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::time::Instant;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    store: ComponentHealth,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// GET /healthz - unauthenticated liveness plus a record store probe
pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let (status, store) = match state.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            ComponentHealth {
                status: "healthy",
                latency_ms: Some(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)),
                error: None,
            },
        ),
        Err(e) => {
            tracing::warn!(error = %e, "record store health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ComponentHealth {
                    status: "unhealthy",
                    latency_ms: None,
                    error: Some(e.to_string()),
                },
            )
        }
    };

    let body = HealthResponse {
        status: if status.is_success() { "healthy" } else { "degraded" },
        timestamp: chrono::Utc::now(),
        store,
    };
    (status, Json(body))
}
