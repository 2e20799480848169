use chrono::{DateTime, Utc};
use game_types::{LetterStatus, Player};

use crate::{GameError, ScoringEngine};

/// One submitted word with its evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Guess {
    pub word: String,
    pub played_at: DateTime<Utc>,
    pub letter_statuses: Vec<LetterStatus>,
}

impl Guess {
    /// Re-evaluate a stored word against `target`.
    pub fn replay(word: impl Into<String>, played_at: DateTime<Utc>, target: &str) -> Result<Self, GameError> {
        let word = word.into();
        let letter_statuses = ScoringEngine::evaluate(&word, target)?;
        Ok(Self {
            word,
            played_at,
            letter_statuses,
        })
    }

    pub fn is_solved(&self) -> bool {
        ScoringEngine::is_solved(&self.letter_statuses)
    }
}

/// One player's participation in a game.
///
/// Guesses are append-only. `finished_at` and `rank` are set together, once,
/// by the owning [`Game`](crate::Game).
#[derive(Debug, Clone)]
pub struct Session {
    player: Player,
    guesses: Vec<Guess>,
    finished_at: Option<DateTime<Utc>>,
    rank: Option<u32>,
}

impl Session {
    pub fn new(player: Player) -> Self {
        Self {
            player,
            guesses: Vec::new(),
            finished_at: None,
            rank: None,
        }
    }

    /// Rebuild a stored session. A rank without a finish time is dropped.
    pub fn restore(
        player: Player,
        guesses: Vec<Guess>,
        finished_at: Option<DateTime<Utc>>,
        rank: Option<u32>,
    ) -> Self {
        Self {
            player,
            guesses,
            rank: finished_at.and(rank),
            finished_at,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn username(&self) -> &str {
        &self.player.username
    }

    pub fn guesses(&self) -> &[Guess] {
        &self.guesses
    }

    pub fn guess_count(&self) -> usize {
        self.guesses.len()
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn rank(&self) -> Option<u32> {
        self.rank
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// The guess shown to other players: the winning guess once finished,
    /// otherwise the most recent one.
    ///
    /// Guesses are never recorded after a session finishes, so both cases
    /// reduce to the last entry.
    pub fn best_guess(&self) -> Option<&Guess> {
        self.guesses.last()
    }

    pub fn solved(&self) -> bool {
        self.best_guess().is_some_and(Guess::is_solved)
    }

    pub(crate) fn record(&mut self, guess: Guess) {
        debug_assert!(!self.is_finished(), "guess recorded on a finished session");
        self.guesses.push(guess);
    }

    pub(crate) fn finish(&mut self, at: DateTime<Utc>, rank: u32) {
        debug_assert!(!self.is_finished(), "session finished twice");
        self.finished_at = Some(at);
        self.rank = Some(rank);
    }
}
