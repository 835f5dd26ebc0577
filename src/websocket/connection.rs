//! Connection Handles
//!
//! A [`Connection`] is the cheap, cloneable handle the registry holds for one
//! open socket. The socket itself is owned by the connection's writer task;
//! the handle only feeds that task through a bounded queue.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique identifier for a connection
pub type ConnectionId = String;

/// Frames queued for a connection's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Encoded envelope
    Text(String),
    /// Close the socket with the given code and reason
    Close { code: u16, reason: String },
}

/// Handle for sending frames to a specific connection
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    open: Arc<AtomicBool>,
    outbound: mpsc::Sender<Frame>,
}

impl Connection {
    /// Create a handle with a fresh identifier
    ///
    /// Returns the handle and the receiving end its writer task drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        Self::with_id(Uuid::new_v4().to_string(), capacity)
    }

    /// Create a handle with a caller-chosen identifier
    pub fn with_id(id: impl Into<ConnectionId>, capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let conn = Self {
            id: id.into(),
            open: Arc::new(AtomicBool::new(true)),
            outbound,
        };
        (conn, rx)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the connection can still accept frames
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.outbound.is_closed()
    }

    /// Flip the open flag; returns true only for the call that closed it
    pub fn mark_closed(&self) -> bool {
        self.open.swap(false, Ordering::AcqRel)
    }

    /// Queue a text frame, waiting at most `timeout` for queue space
    pub async fn send_text(&self, text: String, timeout: Duration) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::Closed);
        }

        match tokio::time::timeout(timeout, self.outbound.send(Frame::Text(text))).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => {
                self.mark_closed();
                Err(SendError::Closed)
            }
            Err(_) => Err(SendError::Timeout(timeout)),
        }
    }

    /// Mark the connection closed and ask the writer to close the socket
    ///
    /// Best effort: if the queue is full or the writer is gone the close
    /// frame is dropped and the socket is torn down when its tasks end.
    pub fn force_close(&self, code: u16, reason: &str) {
        if self.mark_closed() {
            let _ = self.outbound.try_send(Frame::Close {
                code,
                reason: reason.to_string(),
            });
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}

/// A single send to a single connection failed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("Connection closed")]
    Closed,

    #[error("Send timed out after {0:?}")]
    Timeout(Duration),
}
