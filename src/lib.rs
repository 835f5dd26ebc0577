//! # Beacon
//!
//! Real-time fan-out of support-ticket updates and system alerts to
//! connected dashboards over WebSocket.
//!
//! ## Features
//!
//! - **Two independent channels**: tickets and alerts, each with its own
//!   registry of live connections
//! - **Best-effort broadcast**: one slow or dead client never stalls the rest
//! - **Typed wire format**: closed JSON envelopes out, typed commands in
//! - **HTTP event API**: the surrounding application raises events over HTTP
//!   or through the channel handles directly
//!
//! ## Modules
//!
//! - [`websocket`]: Registry, codec, channels and the WebSocket handler
//! - [`api`]: HTTP server with Axum
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use beacon::websocket::{AlertChannel, AlertSeverity, AlertSnapshot, TicketChannel};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let tickets = Arc::new(TicketChannel::default());
//!     let alerts = Arc::new(AlertChannel::default());
//!
//!     tickets
//!         .broadcast_ticket_update(42, "status_change", serde_json::json!({"status": "resolved"}))
//!         .await;
//!
//!     let alert = AlertSnapshot::new(7, "Payments", "Gateway timeouts")
//!         .severity(AlertSeverity::Critical);
//!     let report = alerts.broadcast_new_alert(alert).await;
//!     println!("delivered to {} consoles", report.delivered);
//! }
//! ```

pub mod api;
pub mod config;
pub mod websocket;

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use websocket::{
    AlertChannel, AlertSeverity, AlertSnapshot, BroadcastReport, Channel, ChannelConfig, Command,
    Connection, Envelope, ServerEvent, SessionRegistry, TicketChannel,
};

pub use config::{Config, ConfigError, LoggingConfig};
