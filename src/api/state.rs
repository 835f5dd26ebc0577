//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::websocket::{AlertChannel, ChannelConfig, TicketChannel};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// Support ticket updates channel
    pub tickets: Arc<TicketChannel>,
    /// System alerts channel
    pub alerts: Arc<AlertChannel>,
}

impl AppState {
    /// Create state with both channels using their default settings
    pub fn new(config: ApiConfig) -> Self {
        Self::with_channels(
            config,
            Arc::new(TicketChannel::default()),
            Arc::new(AlertChannel::default()),
        )
    }

    /// Create state with custom channel configuration
    pub fn with_channel_config(
        config: ApiConfig,
        tickets: ChannelConfig,
        alerts: ChannelConfig,
    ) -> Self {
        Self::with_channels(
            config,
            Arc::new(TicketChannel::new(tickets)),
            Arc::new(AlertChannel::new(alerts)),
        )
    }

    /// Create state around channels owned by the caller
    ///
    /// Lets the surrounding application keep its own `Arc`s to raise events.
    pub fn with_channels(
        config: ApiConfig,
        tickets: Arc<TicketChannel>,
        alerts: Arc<AlertChannel>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            start_time: Instant::now(),
            tickets,
            alerts,
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Upgrade path of the ticket updates channel
    pub tickets_path: String,
    /// Upgrade path of the system alerts channel
    pub alerts_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            tickets_path: "/ws/tickets".to_string(),
            alerts_path: "/ws/alerts".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
