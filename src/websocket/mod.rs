//! WebSocket Real-Time Fan-Out
//!
//! Pushes support-ticket updates and system alerts to connected dashboards.
//!
//! ## Architecture
//!
//! - **SessionRegistry**: concurrent map of live connections
//! - **Codec**: JSON envelopes out, typed commands in
//! - **Channel**: lifecycle, command dispatch and best-effort broadcast over
//!   one registry
//! - **TicketChannel / AlertChannel**: the two configured channels
//! - **Handler**: WebSocket upgrade and per-connection tasks
//!
//! ## Usage
//!
//! Clients connect to `/ws/tickets` or `/ws/alerts` and may send:
//! - `{"type": "ping"}` - answered with `pong`
//! - `{"type": "subscribe", "userId": "..."}` - answered with `subscribed`
//! - `{"type": "unsubscribe", "userId": "..."}` - answered with `unsubscribed`
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8090/ws/tickets');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', userId: 'agent-17'}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'ticket_update') console.log(msg.ticketId, msg.updateType);
//! };
//! ```

mod alerts;
mod channel;
mod codec;
mod connection;
mod handler;
mod messages;
mod registry;
mod tickets;

pub use alerts::AlertChannel;
pub use channel::{
    BroadcastReport, Channel, ChannelConfig, INVALID_MESSAGE_FORMAT, SERVER_ERROR_CLOSE_CODE,
    SERVER_ERROR_CLOSE_REASON,
};
pub use codec::{decode, encode, CodecError, DecodeError};
pub use connection::{Connection, ConnectionId, Frame, SendError};
pub use handler::{alerts_handler, tickets_handler};
pub use messages::{AlertSeverity, AlertSnapshot, Command, Envelope, ServerEvent};
pub use registry::SessionRegistry;
pub use tickets::TicketChannel;
