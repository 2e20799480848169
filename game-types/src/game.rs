use crate::GameId;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Per-letter feedback for a guess.
///
/// On the wire each status is a small integer: `Correct = 0`, `Present = 1`,
/// `Absent = 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LetterStatus {
    Correct, // correct letter in correct position
    Present, // correct letter in wrong position
    Absent,  // letter not in word (or already accounted for)
}

impl LetterStatus {
    pub fn code(self) -> u8 {
        match self {
            LetterStatus::Correct => 0,
            LetterStatus::Present => 1,
            LetterStatus::Absent => 2,
        }
    }

    pub fn encode(statuses: &[LetterStatus]) -> Vec<u8> {
        statuses.iter().map(|s| s.code()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameStatus {
    Waiting, // created, not started
    Active,  // guesses accepted
    Ended,   // no further mutation
}

/// Room snapshot delivered to one recipient.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameResponse {
    pub id: GameId,
    pub status: GameStatus,
    pub created_at: String, // ISO 8601 string
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub creator: String,
    pub word_length: usize,
    pub max_guesses: usize,
    /// Only present once `ended_at` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub correct_word: Option<String>,
    /// The recipient's own guesses, words included
    pub guesses: Vec<GuessResponse>,
    /// Best guess of every player in the room
    pub game_performance: Vec<PlayerGuessResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub word: Option<String>,
    pub played_at: String,
    pub status: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerGuessResponse {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub guess_response: Option<GuessResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub rank_offset: Option<u32>,
}
