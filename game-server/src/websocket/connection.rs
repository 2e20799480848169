use game_types::ServerMessage;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};
use uuid::Uuid;

/// Messages that may wait for one socket before it counts as lagging.
pub const OUTGOING_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SendError {
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
    #[error("connection {0} is not keeping up")]
    Lagging(ConnectionId),
}

/// Sending half of one player's duplex channel.
///
/// The socket task owns the receiving half and forwards everything to the
/// websocket. Cloning shares the same channel. The queue is bounded; a send
/// into a full queue fails and flags the connection so its socket task can
/// hang up.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    sender: mpsc::Sender<ServerMessage>,
    lagged: Arc<Notify>,
}

impl Connection {
    pub fn new() -> (Self, mpsc::Receiver<ServerMessage>) {
        let (sender, receiver) = mpsc::channel(OUTGOING_QUEUE_CAPACITY);
        let conn = Self {
            id: ConnectionId::new(),
            sender,
            lagged: Arc::new(Notify::new()),
        };
        (conn, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn send(&self, message: ServerMessage) -> Result<(), SendError> {
        match self.sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.lagged.notify_one();
                Err(SendError::Lagging(self.id))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SendError::Closed(self.id)),
        }
    }

    /// Tell the peer why it is being dropped. The socket task ends once the
    /// close notice has been written, or right away if the queue is full.
    pub fn close(&self, reason: impl Into<String>) {
        let _ = self.send(ServerMessage::ConnectionClosed {
            reason: reason.into(),
        });
    }

    /// Resolves once a send found the queue full.
    pub async fn lagged(&self) {
        self.lagged.notified().await;
    }
}
