use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Machine-readable error code sent to clients alongside a human message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ErrorCode {
    LengthMismatch,
    NotActive,
    UnknownPlayer,
    PlayerFinished,
    AlreadyStarted,
    AlreadyEnded,
    CannotJoinOngoing,
    RoomNotFound,
    RoomClosed,
    TokenExpired,
    NotCreator,
    NoPlayers,
    InvalidWord,
    RateLimited,
    InvalidMessage,
    Unauthenticated,
    Internal,
}
