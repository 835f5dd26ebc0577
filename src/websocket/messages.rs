//! WebSocket Message Types
//!
//! Defines the envelopes pushed from the server to clients and the commands
//! clients may send back. Both are closed tagged enums; the wire form is a
//! flat JSON object keyed by `type`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope sent from server to client
///
/// Every envelope carries the event payload and the millisecond timestamp at
/// which it was built. Envelopes are never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    event: ServerEvent,
    timestamp: i64,
}

impl Envelope {
    /// Wrap an event, stamping it with the current time
    pub fn new(event: ServerEvent) -> Self {
        Self::at(event, Utc::now().timestamp_millis())
    }

    /// Wrap an event with an explicit timestamp in milliseconds
    pub fn at(event: ServerEvent, timestamp: i64) -> Self {
        Self { event, timestamp }
    }

    pub fn event(&self) -> &ServerEvent {
        &self.event
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Wire name of the envelope's `type` field
    pub fn kind(&self) -> &'static str {
        self.event.kind()
    }

    /// Welcome sent once when a connection opens
    pub fn connected(session_id: &str, greeting: &str) -> Self {
        Self::new(ServerEvent::Connection {
            status: "connected".to_string(),
            session_id: session_id.to_string(),
            message: greeting.to_string(),
        })
    }

    pub fn ticket_update(ticket_id: i64, update_type: &str, data: Value) -> Self {
        Self::new(ServerEvent::TicketUpdate {
            ticket_id,
            update_type: update_type.to_string(),
            data,
        })
    }

    pub fn new_alert(alert: AlertSnapshot) -> Self {
        Self::new(ServerEvent::NewAlert { alert })
    }

    pub fn alert_acknowledged(alert_id: i64) -> Self {
        Self::new(ServerEvent::AlertAcknowledged { alert_id })
    }

    pub fn subscribed(user_id: &str, message: &str) -> Self {
        Self::new(ServerEvent::Subscribed {
            user_id: user_id.to_string(),
            message: message.to_string(),
        })
    }

    pub fn unsubscribed(user_id: &str, message: &str) -> Self {
        Self::new(ServerEvent::Unsubscribed {
            user_id: user_id.to_string(),
            message: message.to_string(),
        })
    }

    pub fn user_notification(user_id: &str, data: Value) -> Self {
        Self::new(ServerEvent::UserNotification {
            user_id: user_id.to_string(),
            data,
        })
    }

    pub fn pong() -> Self {
        Self::new(ServerEvent::Pong)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ServerEvent::Error {
            message: message.into(),
        })
    }
}

/// Event payloads sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Connection established
    #[serde(rename_all = "camelCase")]
    Connection {
        /// Always `"connected"`
        status: String,
        /// Identifier assigned to this connection
        session_id: String,
        /// Channel-specific greeting
        message: String,
    },
    /// A support ticket changed
    #[serde(rename_all = "camelCase")]
    TicketUpdate {
        ticket_id: i64,
        /// Kind of change (e.g. `status_change`, `new_reply`)
        update_type: String,
        /// Free-form change details
        data: Value,
    },
    /// A system alert was raised
    NewAlert { alert: AlertSnapshot },
    /// A system alert was acknowledged by an operator
    #[serde(rename_all = "camelCase")]
    AlertAcknowledged { alert_id: i64 },
    /// Subscription confirmed
    #[serde(rename_all = "camelCase")]
    Subscribed { user_id: String, message: String },
    /// Unsubscription confirmed
    #[serde(rename_all = "camelCase")]
    Unsubscribed { user_id: String, message: String },
    /// Notification addressed to a user
    #[serde(rename_all = "camelCase")]
    UserNotification { user_id: String, data: Value },
    /// Pong response to ping
    Pong,
    /// Error message
    Error { message: String },
}

impl ServerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::Connection { .. } => "connection",
            ServerEvent::TicketUpdate { .. } => "ticket_update",
            ServerEvent::NewAlert { .. } => "new_alert",
            ServerEvent::AlertAcknowledged { .. } => "alert_acknowledged",
            ServerEvent::Subscribed { .. } => "subscribed",
            ServerEvent::Unsubscribed { .. } => "unsubscribed",
            ServerEvent::UserNotification { .. } => "user_notification",
            ServerEvent::Pong => "pong",
            ServerEvent::Error { .. } => "error",
        }
    }
}

/// Point-in-time view of a system alert as broadcast to operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSnapshot {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl AlertSnapshot {
    pub fn new(id: i64, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            message: message.into(),
            severity: AlertSeverity::Info,
            source: None,
            acknowledged: false,
            created_at: Utc::now(),
        }
    }

    pub fn severity(mut self, severity: AlertSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Commands sent from client to server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Keepalive
    Ping,
    /// Register interest for a user; `None` when `userId` was absent
    Subscribe { user_id: Option<String> },
    /// Drop interest for a user
    Unsubscribe { user_id: Option<String> },
    /// Well-formed frame with a `type` this server does not handle
    Unknown { kind: String },
}
