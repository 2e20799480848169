use game_types::{ErrorCode, GameId, GameStatus};

/// Recoverable conditions returned to the immediate caller.
///
/// None of these leave a room or the hub in an inconsistent state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("guess has {actual} letters, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("game is not accepting guesses (status: {status:?})")]
    NotActive { status: GameStatus },

    #[error("player {0} is not part of this game")]
    UnknownPlayer(String),

    #[error("player {0} has already finished")]
    PlayerFinished(String),

    #[error("game has already started")]
    AlreadyStarted,

    #[error("game has already ended")]
    AlreadyEnded,

    #[error("you can't join an ongoing game")]
    CannotJoinOngoing,

    #[error("room {0} not found")]
    RoomNotFound(GameId),

    #[error("room {0} has been closed")]
    RoomClosed(GameId),

    #[error("invite token is invalid or expired")]
    TokenExpired,

    #[error("only the room creator can do this")]
    NotCreator,

    #[error("cannot start a game without players")]
    NoPlayers,

    #[error("invalid word: {0}")]
    InvalidWord(String),

    #[error("storage unavailable: {0}")]
    Storage(String),
}

impl GameError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GameError::LengthMismatch { .. } => ErrorCode::LengthMismatch,
            GameError::NotActive { .. } => ErrorCode::NotActive,
            GameError::UnknownPlayer(_) => ErrorCode::UnknownPlayer,
            GameError::PlayerFinished(_) => ErrorCode::PlayerFinished,
            GameError::AlreadyStarted => ErrorCode::AlreadyStarted,
            GameError::AlreadyEnded => ErrorCode::AlreadyEnded,
            GameError::CannotJoinOngoing => ErrorCode::CannotJoinOngoing,
            GameError::RoomNotFound(_) => ErrorCode::RoomNotFound,
            GameError::RoomClosed(_) => ErrorCode::RoomClosed,
            GameError::TokenExpired => ErrorCode::TokenExpired,
            GameError::NotCreator => ErrorCode::NotCreator,
            GameError::NoPlayers => ErrorCode::NoPlayers,
            GameError::InvalidWord(_) => ErrorCode::InvalidWord,
            GameError::Storage(_) => ErrorCode::Internal,
        }
    }
}
