//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes health checks.
//!
//! - GET /health/live - Liveness check (process is alive)
//! - GET /health/ready - Readiness check (ready to serve traffic)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{ConnectionCounts, HealthResponse};
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness check.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Channels live in memory and are built before the listener binds, so a
/// running server is always ready.
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
///
/// Full health status with live connection counts.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        connections: ConnectionCounts {
            tickets: state.tickets.connection_count(),
            alerts: state.alerts.connection_count(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::ApiConfig;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_full_health_counts_connections() {
        let state = Arc::new(AppState::new(ApiConfig::default()));
        let (_conn, _rx) = state.alerts.connect().await;

        let Json(health) = full_health(State(state)).await;

        assert_eq!(health.status, "healthy");
        assert_eq!(health.connections.tickets, 0);
        assert_eq!(health.connections.alerts, 1);
    }
}
