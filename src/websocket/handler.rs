//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and drives each connection: one task
//! writes queued frames to the socket, another reads client frames and
//! dispatches them on the channel.

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::ops::Deref;
use std::sync::Arc;

use super::channel::Channel;
use super::connection::{Connection, Frame};
use super::messages::Envelope;
use crate::api::AppState;

/// Upgrade handler for the ticket updates channel
pub async fn tickets_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let channel = Arc::clone(&state.tickets);
    ws.on_upgrade(move |socket| handle_socket(socket, channel))
}

/// Upgrade handler for the system alerts channel
pub async fn alerts_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let channel = Arc::clone(&state.alerts);
    ws.on_upgrade(move |socket| handle_socket(socket, channel))
}

/// Handle an established WebSocket connection on `channel`
async fn handle_socket<C>(socket: WebSocket, channel: Arc<C>)
where
    C: Deref<Target = Channel> + Send + Sync + 'static,
{
    let (mut sender, mut receiver) = socket.split();

    // Register and queue the welcome before reading anything
    let (conn, mut rx) = channel.connect().await;
    let connection_id = conn.id().to_string();

    let conn_id_for_send = connection_id.clone();

    // Task to forward queued frames to the WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                Frame::Text(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        tracing::debug!(
                            connection_id = %conn_id_for_send,
                            "WebSocket send failed, closing connection"
                        );
                        break;
                    }
                }
                Frame::Close { code, reason } => {
                    let _ = sender
                        .send(Message::Close(Some(CloseFrame {
                            code,
                            reason: reason.into(),
                        })))
                        .await;
                    break;
                }
            }
        }
    });

    let channel_for_recv = Arc::clone(&channel);
    let conn_for_recv = conn.clone();

    // Task to receive client frames and dispatch them
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&channel_for_recv, &conn_for_recv, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    channel_for_recv.fail(&conn_for_recv, &e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            // Wait for the reader to stop before deregistering
            let _ = recv_task.await;
            channel.close(&connection_id);
        }
        _ = &mut recv_task => {
            channel.close(&connection_id);
            drop(conn);
            // Let a queued close frame reach the peer, then give up
            let grace = channel.config().send_timeout;
            if tokio::time::timeout(grace, &mut send_task).await.is_err() {
                send_task.abort();
            }
        }
    }
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(channel: &Channel, conn: &Connection, message: Message) -> bool {
    match message {
        Message::Text(text) => {
            channel.handle_text(conn, &text).await;
            true
        }
        Message::Binary(_) => {
            let error_msg = Envelope::error("Binary messages not supported");
            let _ = channel.send_to(conn, &error_msg).await;
            true
        }
        Message::Ping(_) | Message::Pong(_) => {
            // Axum answers protocol pings itself
            true
        }
        Message::Close(_) => {
            tracing::debug!(
                channel = %channel.name(),
                connection_id = %conn.id(),
                "Client requested close"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::channel::tests::{next_json, test_config};

    #[tokio::test]
    async fn test_binary_frame_gets_error_and_stays_open() {
        let channel = Channel::new(test_config());
        let (conn, mut rx) = channel.connect().await;
        let _ = next_json(&mut rx);

        let keep_open = handle_ws_message(&channel, &conn, Message::Binary(vec![1, 2, 3])).await;

        assert!(keep_open);
        let reply = next_json(&mut rx);
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["message"], "Binary messages not supported");
        assert!(rx.try_recv().is_err());
        assert!(conn.is_open());
        assert!(channel.registry().contains(conn.id()));
    }

    #[tokio::test]
    async fn test_close_frame_ends_connection() {
        let channel = Channel::new(test_config());
        let (conn, mut rx) = channel.connect().await;
        let _ = next_json(&mut rx);

        assert!(!handle_ws_message(&channel, &conn, Message::Close(None)).await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_protocol_ping_pong_queue_nothing() {
        let channel = Channel::new(test_config());
        let (conn, mut rx) = channel.connect().await;
        let _ = next_json(&mut rx);

        assert!(handle_ws_message(&channel, &conn, Message::Ping(vec![9])).await);
        assert!(handle_ws_message(&channel, &conn, Message::Pong(vec![9])).await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_text_frame_is_dispatched() {
        let channel = Channel::new(test_config());
        let (conn, mut rx) = channel.connect().await;
        let _ = next_json(&mut rx);

        let keep_open =
            handle_ws_message(&channel, &conn, Message::Text(r#"{"type":"ping"}"#.to_string()))
                .await;

        assert!(keep_open);
        assert_eq!(next_json(&mut rx)["type"], "pong");
    }
}
