use std::sync::Arc;
use tracing::{debug, warn};

use crate::service::GameService;
use crate::websocket::connection::Connection;
use game_core::GameError;
use game_types::{ClientMessage, ErrorCode, GameId, Player, ServerMessage};

/// Dispatches messages from one joined player's socket.
#[derive(Clone)]
pub struct MessageHandler {
    room_id: GameId,
    player: Player,
    connection: Connection,
    service: Arc<dyn GameService>,
}

impl MessageHandler {
    pub fn new(
        room_id: GameId,
        player: Player,
        connection: Connection,
        service: Arc<dyn GameService>,
    ) -> Self {
        Self {
            room_id,
            player,
            connection,
            service,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Handle one message. Rejections go back to this player only; state
    /// changes reach everyone through the room broadcast.
    pub async fn handle_message(&self, message: ClientMessage) {
        let result = match message {
            ClientMessage::StartGame => self.handle_start_game().await,
            ClientMessage::SubmitGuess { word } => self.handle_submit_guess(&word).await,
            ClientMessage::Heartbeat => {
                self.send(ServerMessage::HeartbeatAck);
                Ok(())
            }
        };

        if let Err(e) = result {
            debug!(
                room_id = %self.room_id,
                player = %self.player.username,
                "Rejected: {}",
                e
            );
            self.send_error(e.code(), e.to_string());
        }
    }

    async fn handle_start_game(&self) -> Result<(), GameError> {
        self.service.start_game(self.room_id, &self.player).await
    }

    async fn handle_submit_guess(&self, word: &str) -> Result<(), GameError> {
        self.service
            .submit_guess(self.room_id, &self.player, word)
            .await
            .map(|_| ())
    }

    pub fn send_error(&self, code: ErrorCode, message: impl Into<String>) {
        self.send(ServerMessage::Error {
            code,
            message: message.into(),
        });
    }

    fn send(&self, message: ServerMessage) {
        if let Err(e) = self.connection.send(message) {
            warn!("Failed to queue message: {}", e);
        }
    }
}
