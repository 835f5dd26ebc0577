//! Ticket Updates Channel
//!
//! Pushes support-ticket changes to every connected support dashboard.

use serde_json::Value;
use std::ops::Deref;

use super::channel::{BroadcastReport, Channel, ChannelConfig};
use super::messages::Envelope;

/// The tickets broadcast channel
pub struct TicketChannel {
    channel: Channel,
}

impl TicketChannel {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            channel: Channel::new(config),
        }
    }

    /// Broadcast a ticket change to every open connection
    pub async fn broadcast_ticket_update(
        &self,
        ticket_id: i64,
        update_type: &str,
        data: Value,
    ) -> BroadcastReport {
        tracing::debug!(ticket_id, update_type = %update_type, "Broadcasting ticket update");
        self.channel
            .broadcast(&Envelope::ticket_update(ticket_id, update_type, data))
            .await
    }
}

impl Default for TicketChannel {
    fn default() -> Self {
        Self::new(ChannelConfig::tickets())
    }
}

impl Deref for TicketChannel {
    type Target = Channel;

    fn deref(&self) -> &Channel {
        &self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::channel::tests::{next_json, test_config};
    use serde_json::json;

    #[tokio::test]
    async fn test_ticket_session_scenario() {
        let tickets = TicketChannel::new(test_config());
        let (conn, mut rx) = tickets.connect().await;
        let id = conn.id().to_string();

        let welcome = next_json(&mut rx);
        assert_eq!(welcome["type"], "connection");
        assert_eq!(welcome["status"], "connected");
        assert_eq!(welcome["sessionId"], id.as_str());

        tickets.handle_text(&conn, r#"{"type":"ping"}"#).await;
        let pong = next_json(&mut rx);
        assert_eq!(pong["type"], "pong");
        assert!(pong["timestamp"].is_i64());

        let report = tickets
            .broadcast_ticket_update(42, "status_change", json!({"status": "in_progress"}))
            .await;
        assert_eq!(report.delivered, 1);
        let update = next_json(&mut rx);
        assert_eq!(update["type"], "ticket_update");
        assert_eq!(update["updateType"], "status_change");
        assert_eq!(update["ticketId"], 42);
        assert_eq!(update["data"]["status"], "in_progress");
        assert!(update["timestamp"].is_i64());

        assert!(tickets.close(&id));
        assert!(!tickets.registry().contains(&id));

        let report = tickets
            .broadcast_ticket_update(42, "new_reply", json!({}))
            .await;
        assert_eq!(report.attempted, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_default_greeting() {
        let tickets = TicketChannel::default();
        assert_eq!(tickets.name(), "tickets");
        assert_eq!(tickets.config().greeting, "Connected to ticket updates");
    }
}
