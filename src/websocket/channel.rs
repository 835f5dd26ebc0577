//! Broadcast Channel
//!
//! One channel = one registry of live connections plus the logic that runs
//! on top of it: connection lifecycle, inbound command dispatch and
//! best-effort broadcast. The tickets and alerts channels are both instances
//! of [`Channel`] with different [`ChannelConfig`]s.
//!
//! ## Lifecycle
//!
//! `connect`/`open` registers the handle and queues the welcome envelope.
//! `close` removes it; the first call wins and later calls are no-ops.
//! `fail` logs a transport error, asks the writer to close the socket with
//! code 1011 and then closes.

use dashmap::DashMap;
use futures_util::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

use super::codec::{decode, encode};
use super::connection::{Connection, ConnectionId, Frame, SendError};
use super::messages::{Command, Envelope};
use super::registry::SessionRegistry;

/// Close code sent when a connection is torn down after a transport error
pub const SERVER_ERROR_CLOSE_CODE: u16 = 1011;

/// Close reason sent alongside [`SERVER_ERROR_CLOSE_CODE`]
pub const SERVER_ERROR_CLOSE_REASON: &str = "Server error";

/// Reply to any frame that fails to decode
pub const INVALID_MESSAGE_FORMAT: &str = "Invalid message format";

/// Configuration for one broadcast channel
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Short name used in logs (`tickets`, `alerts`)
    pub name: String,
    /// Message carried by the welcome envelope
    pub greeting: String,
    /// Message carried by `subscribed` acknowledgements
    pub subscribed_message: String,
    /// Message carried by `unsubscribed` acknowledgements
    pub unsubscribed_message: String,
    /// Upper bound on a single enqueue to a connection
    pub send_timeout: Duration,
    /// Frames buffered per connection before sends start waiting
    pub outbound_capacity: usize,
}

impl ChannelConfig {
    pub fn tickets() -> Self {
        Self {
            name: "tickets".to_string(),
            greeting: "Connected to ticket updates".to_string(),
            subscribed_message: "Subscribed to ticket updates".to_string(),
            unsubscribed_message: "Unsubscribed from ticket updates".to_string(),
            ..Self::default()
        }
    }

    pub fn alerts() -> Self {
        Self {
            name: "alerts".to_string(),
            greeting: "Connected to system alerts".to_string(),
            subscribed_message: "Subscribed to system alerts".to_string(),
            unsubscribed_message: "Unsubscribed from system alerts".to_string(),
            ..Self::default()
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            greeting: "Connected".to_string(),
            subscribed_message: "Subscribed".to_string(),
            unsubscribed_message: "Unsubscribed".to_string(),
            send_timeout: Duration::from_secs(5),
            outbound_capacity: 64,
        }
    }
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// Connections a send was attempted on
    pub attempted: usize,
    /// Sends that were accepted
    pub delivered: usize,
    /// Sends that failed (closed or timed out)
    pub failed: usize,
    /// Registered connections skipped because they were already closed
    pub skipped: usize,
}

/// A registry of live connections with lifecycle, dispatch and broadcast
pub struct Channel {
    config: ChannelConfig,
    registry: SessionRegistry,
    /// Connection → user id recorded by `subscribe`
    subscriptions: DashMap<ConnectionId, String>,
}

impl Channel {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            registry: SessionRegistry::new(),
            subscriptions: DashMap::new(),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// User id the connection last subscribed with, if any
    ///
    /// Recorded for observability only; broadcasts do not filter on it.
    pub fn subscribed_user(&self, id: &str) -> Option<String> {
        self.subscriptions.get(id).map(|entry| entry.value().clone())
    }

    /// Create a fresh connection handle and open it on this channel
    ///
    /// Returns the handle and the queue its writer task should drain.
    pub async fn connect(&self) -> (Connection, mpsc::Receiver<Frame>) {
        let (conn, rx) = Connection::new(self.config.outbound_capacity);
        self.open(&conn).await;
        (conn, rx)
    }

    /// Register a connection and send it the welcome envelope
    pub async fn open(&self, conn: &Connection) {
        self.registry.put(conn.id(), conn.clone());
        tracing::info!(
            channel = %self.config.name,
            connection_id = %conn.id(),
            connections = self.registry.len(),
            "WebSocket connected"
        );

        let welcome = Envelope::connected(conn.id(), &self.config.greeting);
        if self.send_to(conn, &welcome).await.is_err() {
            tracing::error!(
                channel = %self.config.name,
                connection_id = %conn.id(),
                "Failed to send connected message"
            );
            self.close(conn.id());
        }
    }

    /// Deregister a connection
    ///
    /// Returns true if this call removed it.
    pub fn close(&self, id: &str) -> bool {
        // Registry first: `subscribe` re-checks it after recording a user
        let removed = self.registry.remove(id);
        self.subscriptions.remove(id);
        match removed {
            Some(conn) => {
                conn.mark_closed();
                tracing::info!(
                    channel = %self.config.name,
                    connection_id = %id,
                    connections = self.registry.len(),
                    "WebSocket disconnected"
                );
                true
            }
            None => false,
        }
    }

    /// Handle a fatal transport error on one connection
    pub fn fail(&self, conn: &Connection, error: &dyn fmt::Display) {
        tracing::error!(
            channel = %self.config.name,
            connection_id = %conn.id(),
            error = %error,
            "WebSocket transport error"
        );
        conn.force_close(SERVER_ERROR_CLOSE_CODE, SERVER_ERROR_CLOSE_REASON);
        self.close(conn.id());
    }

    /// Decode and dispatch one inbound text frame
    pub async fn handle_text(&self, conn: &Connection, text: &str) {
        match decode(text) {
            Ok(command) => self.handle_command(conn, command).await,
            Err(e) => {
                tracing::debug!(
                    channel = %self.config.name,
                    connection_id = %conn.id(),
                    error = %e,
                    "Invalid client message"
                );
                let _ = self.send_to(conn, &Envelope::error(INVALID_MESSAGE_FORMAT)).await;
            }
        }
    }

    /// Dispatch a decoded command, replying to the sender only
    pub async fn handle_command(&self, conn: &Connection, command: Command) {
        match command {
            Command::Ping => {
                let _ = self.send_to(conn, &Envelope::pong()).await;
            }
            Command::Subscribe { user_id } => {
                let Some(user_id) = non_empty(user_id) else {
                    tracing::warn!(
                        channel = %self.config.name,
                        connection_id = %conn.id(),
                        "Subscribe without userId ignored"
                    );
                    return;
                };
                self.subscriptions
                    .insert(conn.id().to_string(), user_id.clone());
                if !self.registry.contains(conn.id()) {
                    // Closed while this frame was in flight
                    self.subscriptions.remove(conn.id());
                    return;
                }
                tracing::debug!(
                    channel = %self.config.name,
                    connection_id = %conn.id(),
                    user_id = %user_id,
                    "Subscribed"
                );
                let ack = Envelope::subscribed(&user_id, &self.config.subscribed_message);
                let _ = self.send_to(conn, &ack).await;
            }
            Command::Unsubscribe { user_id } => {
                let Some(user_id) = non_empty(user_id) else {
                    tracing::warn!(
                        channel = %self.config.name,
                        connection_id = %conn.id(),
                        "Unsubscribe without userId ignored"
                    );
                    return;
                };
                // Only clears the recorded user when the frame names it
                self.subscriptions
                    .remove_if(conn.id(), |_, recorded| *recorded == user_id);
                tracing::debug!(
                    channel = %self.config.name,
                    connection_id = %conn.id(),
                    user_id = %user_id,
                    "Unsubscribed"
                );
                let ack = Envelope::unsubscribed(&user_id, &self.config.unsubscribed_message);
                let _ = self.send_to(conn, &ack).await;
            }
            Command::Unknown { kind } => {
                tracing::debug!(
                    channel = %self.config.name,
                    connection_id = %conn.id(),
                    kind = %kind,
                    "Unknown message type ignored"
                );
            }
        }
    }

    /// Send one envelope to one connection
    pub async fn send_to(&self, conn: &Connection, envelope: &Envelope) -> Result<(), SendError> {
        let text = match encode(envelope) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize message");
                return Err(SendError::Closed);
            }
        };

        conn.send_text(text, self.config.send_timeout)
            .await
            .inspect_err(|e| {
                tracing::debug!(
                    channel = %self.config.name,
                    connection_id = %conn.id(),
                    error = %e,
                    "Send to connection failed"
                );
            })
    }

    /// Push an envelope to every open connection
    ///
    /// Sends run concurrently, each bounded by the send timeout. Failures are
    /// logged and counted, never returned.
    pub async fn broadcast(&self, envelope: &Envelope) -> BroadcastReport {
        let text = match encode(envelope) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(channel = %self.config.name, error = %e, "Failed to serialize broadcast");
                return BroadcastReport::default();
            }
        };

        let snapshot = self.registry.snapshot();
        let mut report = BroadcastReport::default();
        let targets: Vec<Connection> = snapshot
            .into_iter()
            .filter(|conn| {
                let open = conn.is_open();
                if !open {
                    report.skipped += 1;
                }
                open
            })
            .collect();

        report.attempted = targets.len();
        let timeout = self.config.send_timeout;
        let results = join_all(targets.iter().map(|conn| {
            let text = text.clone();
            async move { conn.send_text(text, timeout).await }
        }))
        .await;

        for (conn, result) in targets.iter().zip(results) {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        channel = %self.config.name,
                        connection_id = %conn.id(),
                        kind = envelope.kind(),
                        error = %e,
                        "Broadcast send failed"
                    );
                }
            }
        }

        tracing::debug!(
            channel = %self.config.name,
            kind = envelope.kind(),
            delivered = report.delivered,
            failed = report.failed,
            skipped = report.skipped,
            "Broadcast event"
        );

        report
    }

    /// Notify a user
    ///
    /// Goes to every open connection on the channel, not only those that
    /// subscribed with `user_id`.
    pub async fn send_to_user(&self, user_id: &str, data: Value) -> BroadcastReport {
        self.broadcast(&Envelope::user_notification(user_id, data))
            .await
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
