//! Data Transfer Objects
//!
//! Request and response types for the event endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::websocket::BroadcastReport;

// ============================================
// EVENT DTOs
// ============================================

/// Ticket update request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketUpdateRequest {
    /// Kind of change (e.g. `status_change`)
    pub update_type: String,
    /// Change details forwarded verbatim
    #[serde(default)]
    pub data: Value,
}

/// Target channel for a user notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelName {
    #[default]
    Tickets,
    Alerts,
}

/// User notification request
#[derive(Debug, Deserialize)]
pub struct UserNotificationRequest {
    #[serde(default)]
    pub channel: ChannelName,
    #[serde(default)]
    pub data: Value,
}

/// Response for every event endpoint
#[derive(Debug, Serialize)]
pub struct BroadcastResponse {
    /// Envelope type that was broadcast
    #[serde(rename = "type")]
    pub kind: String,
    /// Delivery counts
    #[serde(flatten)]
    pub report: BroadcastReport,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub connections: ConnectionCounts,
}

/// Live connections per channel
#[derive(Debug, Serialize)]
pub struct ConnectionCounts {
    pub tickets: usize,
    pub alerts: usize,
}
