use anyhow::Result;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::room::Room;
use game_core::{Game, GameError, GameRules, TargetWords, WordValidator};
use game_types::{GameId, Player};

/// How the hub creates rooms and normalizes guesses.
#[derive(Debug, Clone, Copy)]
pub struct HubSettings {
    pub word_length: usize,
    pub rules: GameRules,
    pub case_insensitive: bool,
    pub require_dictionary_words: bool,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            word_length: 5,
            rules: GameRules::default(),
            case_insensitive: true,
            require_dictionary_words: false,
        }
    }
}

/// Registry of live rooms.
///
/// Lookups clone an `Arc<Room>` out of the map and never touch room state, so
/// they don't wait on any room's lock.
pub struct Hub {
    rooms: DashMap<GameId, Arc<Room>>,
    words: WordValidator,
    targets: TargetWords,
    settings: HubSettings,
}

impl Hub {
    /// Fails if the dictionary has no words of the configured length.
    pub fn new(words: WordValidator, settings: HubSettings) -> Result<Self> {
        let targets = words.target_pool(settings.word_length)?;
        info!(
            "Hub ready with {} candidate {}-letter targets",
            targets.len(),
            settings.word_length
        );

        Ok(Self {
            rooms: DashMap::new(),
            words,
            targets,
            settings,
        })
    }

    pub fn settings(&self) -> HubSettings {
        self.settings
    }

    pub fn create_room(&self, creator: Player) -> GameId {
        let word = self.targets.pick().to_string();
        self.create_room_with(creator, word, self.settings.rules)
    }

    /// Create a room with a fixed target word and rules.
    pub fn create_room_with(&self, creator: Player, word: impl Into<String>, rules: GameRules) -> GameId {
        let mut word = word.into();
        if self.settings.case_insensitive {
            word = word.to_lowercase();
        }

        let id = Uuid::new_v4();
        let username = creator.username.clone();
        let room = Room::new(Game::new(id, creator, word, rules));
        self.rooms.insert(id, Arc::new(room));

        info!(room_id = %id, creator = %username, "Room created");
        id
    }

    pub fn get_room(&self, id: GameId) -> Option<Arc<Room>> {
        self.rooms.get(&id).map(|entry| entry.value().clone())
    }

    pub fn room(&self, id: GameId) -> Result<Arc<Room>, GameError> {
        self.get_room(id).ok_or(GameError::RoomNotFound(id))
    }

    /// Evict a room and disconnect everyone in it.
    ///
    /// The hub never persists anything; flush the final game first.
    pub async fn close_room(&self, id: GameId, reason: &str) -> bool {
        match self.rooms.remove(&id) {
            Some((_, room)) => {
                room.close(reason).await;
                true
            }
            None => false,
        }
    }

    /// Current rooms, for background sweeps.
    pub fn rooms(&self) -> Vec<Arc<Room>> {
        self.rooms.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Normalize a raw guess before it reaches a room.
    ///
    /// Trims, folds case when configured, and rejects anything that isn't
    /// purely alphabetic (or isn't a dictionary word, when that is required).
    /// Length is left to the game, which reports it as a mismatch.
    pub fn prepare_guess(&self, raw: &str) -> Result<String, GameError> {
        let trimmed = raw.trim();
        let word = if self.settings.case_insensitive {
            trimmed.to_lowercase()
        } else {
            trimmed.to_string()
        };

        if word.is_empty() || !self.words.is_alphabetic(&word) {
            return Err(GameError::InvalidWord(raw.to_string()));
        }
        if self.settings.require_dictionary_words && !self.words.is_valid_word(&word) {
            return Err(GameError::InvalidWord(word));
        }

        Ok(word)
    }
}
