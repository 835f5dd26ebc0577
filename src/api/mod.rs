//! Beacon HTTP API
//!
//! HTTP layer for Beacon, built with Axum. Hosts the two WebSocket upgrade
//! endpoints and the routes the surrounding application calls to raise
//! events.
//!
//! # Endpoints
//!
//! ## WebSocket
//! - `GET /ws/tickets` - Ticket updates stream
//! - `GET /ws/alerts` - System alerts stream
//!
//! ## Events
//! - `POST /api/v1/tickets/:ticket_id/updates` - Broadcast a ticket update
//! - `POST /api/v1/alerts` - Broadcast a new alert
//! - `POST /api/v1/alerts/:alert_id/acknowledge` - Broadcast an acknowledgement
//! - `POST /api/v1/users/:user_id/notify` - Notify a user
//!
//! ## Health
//! - `GET /health/live` - Liveness check
//! - `GET /health/ready` - Readiness check
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,no_run
//! use beacon::api::{serve, ApiConfig, AppState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApiConfig::default();
//!     let state = AppState::new(config.clone());
//!
//!     // Keep handles to raise events from elsewhere in the application
//!     let tickets = state.tickets.clone();
//!     tokio::spawn(async move {
//!         tickets
//!             .broadcast_ticket_update(42, "status_change", serde_json::json!({"status": "resolved"}))
//!             .await;
//!     });
//!
//!     serve(state, &config).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::{alerts_handler, tickets_handler};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/tickets/:ticket_id/updates", post(routes::events::ticket_update))
        .route("/alerts", post(routes::events::new_alert))
        .route(
            "/alerts/:alert_id/acknowledge",
            post(routes::events::acknowledge_alert),
        )
        .route("/users/:user_id/notify", post(routes::events::notify_user));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let ws_routes = Router::new()
        .route(&state.config.tickets_path, get(tickets_handler))
        .route(&state.config.alerts_path, get(alerts_handler));

    let shared_state = Arc::new(state);

    Router::new()
        .merge(ws_routes)
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        // Upgrades are accepted from any origin
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        tickets = %config.tickets_path,
        alerts = %config.alerts_path,
        "Beacon listening on {}",
        addr
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Beacon shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, AppState) {
        let state = AppState::new(ApiConfig::default());
        let router = build_router(state.clone());
        (router, state)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["connections"]["tickets"], 0);
    }

    #[tokio::test]
    async fn test_ticket_update_reaches_connection() {
        let (app, state) = create_test_app();
        let (_conn, mut rx) = state.tickets.connect().await;
        let _ = rx.recv().await;

        let response = app
            .oneshot(post_json(
                "/api/v1/tickets/42/updates",
                r#"{"updateType": "status_change", "data": {"status": "closed"}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["type"], "ticket_update");
        assert_eq!(body["delivered"], 1);

        match rx.recv().await {
            Some(crate::websocket::Frame::Text(text)) => {
                let msg: serde_json::Value = serde_json::from_str(&text).unwrap();
                assert_eq!(msg["ticketId"], 42);
                assert_eq!(msg["data"]["status"], "closed");
            }
            other => panic!("expected ticket update, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ticket_update_requires_update_type() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/tickets/1/updates",
                r#"{"updateType": "  "}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_json_rejected() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(post_json("/api/v1/alerts", "not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_new_alert_with_no_listeners() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/alerts",
                r#"{"id": 5, "title": "Queue backlog", "message": "Orders queue above 10k", "severity": "warning"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["attempted"], 0);
    }

    #[tokio::test]
    async fn test_notify_user_on_alerts_channel() {
        let (app, state) = create_test_app();
        let (_a, _ra) = state.alerts.connect().await;
        let (_b, _rb) = state.alerts.connect().await;

        let response = app
            .oneshot(post_json(
                "/api/v1/users/admin-1/notify",
                r#"{"channel": "alerts", "data": {"text": "hi"}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["delivered"], 2);
    }

    #[tokio::test]
    async fn test_plain_get_on_ws_path_is_rejected() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ws/tickets")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
