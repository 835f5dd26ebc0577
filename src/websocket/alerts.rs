//! System Alerts Channel
//!
//! Pushes newly raised alerts and acknowledgements to admin consoles.

use std::ops::Deref;

use super::channel::{BroadcastReport, Channel, ChannelConfig};
use super::messages::{AlertSnapshot, Envelope};

/// The alerts broadcast channel
pub struct AlertChannel {
    channel: Channel,
}

impl AlertChannel {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            channel: Channel::new(config),
        }
    }

    /// Broadcast a newly raised alert
    pub async fn broadcast_new_alert(&self, alert: AlertSnapshot) -> BroadcastReport {
        tracing::debug!(alert_id = alert.id, severity = ?alert.severity, "Broadcasting new alert");
        self.channel.broadcast(&Envelope::new_alert(alert)).await
    }

    /// Broadcast that an alert was acknowledged
    pub async fn broadcast_alert_acknowledged(&self, alert_id: i64) -> BroadcastReport {
        tracing::debug!(alert_id, "Broadcasting alert acknowledgement");
        self.channel
            .broadcast(&Envelope::alert_acknowledged(alert_id))
            .await
    }
}

impl Default for AlertChannel {
    fn default() -> Self {
        Self::new(ChannelConfig::alerts())
    }
}

impl Deref for AlertChannel {
    type Target = Channel;

    fn deref(&self) -> &Channel {
        &self.channel
    }
}
