use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{ErrorCode, GameId, GameResponse};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    StartGame,
    SubmitGuess { word: String },
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    /// Full room snapshot, personalized for the recipient.
    GameState { state: GameResponse },
    Error { code: ErrorCode, message: String },
    /// Last message on a connection the server is closing.
    ConnectionClosed { reason: String },
    HeartbeatAck,
}

/// Body of `POST /room`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateRoomResponse {
    pub id: GameId,
}

/// Body of `GET /join/room/{id}`; the token opens `/live?token=`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InviteResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub error: String,
}
