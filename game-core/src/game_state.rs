use chrono::{DateTime, Utc};
use game_types::{GameId, GameStatus, Player};
use std::collections::HashMap;

use crate::{GameError, Guess, ScoringEngine, Session};

/// Per-room policy fixed at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRules {
    pub max_guesses: usize,
    pub allow_late_join: bool,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_guesses: 6,
            allow_late_join: false,
        }
    }
}

/// What a successful guess did to the game.
#[derive(Debug, Clone)]
pub struct GuessOutcome {
    pub guess: Guess,
    /// Set when this guess finished the player's session
    pub rank: Option<u32>,
    /// Set when this guess finished the last open session
    pub game_ended: bool,
}

impl GuessOutcome {
    pub fn finished(&self) -> bool {
        self.rank.is_some()
    }
}

/// Stored fields of a game, enough to rebuild it outside a live room.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub id: GameId,
    pub creator: Player,
    pub correct_word: String,
    pub rules: GameRules,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// One round of the game: Waiting -> Active -> Ended.
///
/// All mutation goes through methods on this type; sessions are never handed
/// out mutably.
#[derive(Debug, Clone)]
pub struct Game {
    id: GameId,
    creator: Player,
    correct_word: String,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    sessions: HashMap<String, Session>,
    rules: GameRules,
    finished_count: u32,
}

impl Game {
    pub fn new(id: GameId, creator: Player, correct_word: impl Into<String>, rules: GameRules) -> Self {
        Self {
            id,
            creator,
            correct_word: correct_word.into(),
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            sessions: HashMap::new(),
            rules,
            finished_count: 0,
        }
    }

    /// Rebuild a game from storage, e.g. to render it after its room is gone.
    pub fn restore(record: GameRecord, sessions: impl IntoIterator<Item = Session>) -> Self {
        let sessions: HashMap<String, Session> = sessions
            .into_iter()
            .map(|session| (session.username().to_string(), session))
            .collect();
        let finished_count = sessions.values().filter_map(Session::rank).max().unwrap_or(0);

        Self {
            id: record.id,
            creator: record.creator,
            correct_word: record.correct_word,
            created_at: record.created_at,
            started_at: record.started_at,
            ended_at: record.ended_at,
            sessions,
            rules: record.rules,
            finished_count,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn creator(&self) -> &Player {
        &self.creator
    }

    pub fn correct_word(&self) -> &str {
        &self.correct_word
    }

    pub fn word_length(&self) -> usize {
        self.correct_word.chars().count()
    }

    pub fn rules(&self) -> GameRules {
        self.rules
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn status(&self) -> GameStatus {
        if self.ended_at.is_some() {
            GameStatus::Ended
        } else if self.started_at.is_some() {
            GameStatus::Active
        } else {
            GameStatus::Waiting
        }
    }

    pub fn session(&self, username: &str) -> Option<&Session> {
        self.sessions.get(username)
    }

    pub fn has_session(&self, username: &str) -> bool {
        self.sessions.contains_key(username)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn player_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn finished_count(&self) -> u32 {
        self.finished_count
    }

    fn all_finished(&self) -> bool {
        !self.sessions.is_empty() && self.sessions.values().all(Session::is_finished)
    }

    /// Read-only admission check for `username`.
    ///
    /// Players with an existing session can always come back. Newcomers are
    /// admitted while Waiting, during Active only if the rules allow late
    /// joins, and never once the game has ended.
    pub fn check_admission(&self, username: &str) -> Result<(), GameError> {
        if self.has_session(username) {
            return Ok(());
        }

        match self.status() {
            GameStatus::Waiting => Ok(()),
            GameStatus::Active if self.rules.allow_late_join => Ok(()),
            GameStatus::Active => Err(GameError::CannotJoinOngoing),
            GameStatus::Ended => Err(GameError::AlreadyEnded),
        }
    }

    /// Create a session for `player` if one doesn't exist yet.
    ///
    /// Returns true when a new session was created.
    pub fn admit(&mut self, player: &Player) -> Result<bool, GameError> {
        self.check_admission(&player.username)?;

        if self.has_session(&player.username) {
            return Ok(false);
        }

        self.sessions
            .insert(player.username.clone(), Session::new(player.clone()));
        Ok(true)
    }

    pub fn start(&mut self) -> Result<(), GameError> {
        if self.status() != GameStatus::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if self.sessions.is_empty() {
            return Err(GameError::NoPlayers);
        }

        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// End the game regardless of unfinished sessions.
    ///
    /// Unfinished sessions keep no finish time and no rank.
    pub fn force_end(&mut self) -> Result<(), GameError> {
        if self.ended_at.is_some() {
            return Err(GameError::AlreadyEnded);
        }

        self.ended_at = Some(Utc::now());
        Ok(())
    }

    pub fn submit_guess(&mut self, player: &Player, word: &str) -> Result<GuessOutcome, GameError> {
        let status = self.status();
        if status != GameStatus::Active {
            return Err(GameError::NotActive { status });
        }

        match self.sessions.get(&player.username) {
            Some(session) if session.is_finished() => {
                return Err(GameError::PlayerFinished(player.username.clone()));
            }
            Some(_) => {}
            None if self.rules.allow_late_join => {}
            None => return Err(GameError::UnknownPlayer(player.username.clone())),
        }

        // Nothing is recorded for a guess that fails evaluation
        let letter_statuses = ScoringEngine::evaluate(word, &self.correct_word)?;
        let now = Utc::now();
        let guess = Guess {
            word: word.to_string(),
            played_at: now,
            letter_statuses,
        };

        let max_guesses = self.rules.max_guesses;
        let session = self
            .sessions
            .entry(player.username.clone())
            .or_insert_with(|| Session::new(player.clone()));
        session.record(guess.clone());

        let rank = if guess.is_solved() || session.guess_count() >= max_guesses {
            self.finished_count += 1;
            session.finish(now, self.finished_count);
            Some(self.finished_count)
        } else {
            None
        };

        let game_ended = rank.is_some() && self.all_finished();
        if game_ended {
            self.ended_at = Some(now);
        }

        Ok(GuessOutcome {
            guess,
            rank,
            game_ended,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_types::LetterStatus;
    use uuid::Uuid;

    fn player(name: &str) -> Player {
        Player::new(Uuid::new_v4(), name)
    }

    fn game_with(word: &str, rules: GameRules, players: &[&Player]) -> Game {
        let creator = players.first().map(|p| (*p).clone()).unwrap_or_else(|| player("host"));
        let mut game = Game::new(Uuid::new_v4(), creator, word, rules);
        for p in players {
            game.admit(p).unwrap();
        }
        game
    }

    #[test]
    fn test_new_game_is_waiting() {
        let alice = player("alice");
        let game = game_with("hello", GameRules::default(), &[&alice]);

        assert_eq!(game.status(), GameStatus::Waiting);
        assert_eq!(game.word_length(), 5);
        assert!(game.started_at().is_none());
        assert!(game.ended_at().is_none());
        assert_eq!(game.player_count(), 1);
    }

    #[test]
    fn test_start_requires_waiting_and_players() {
        let host = player("host");
        let mut empty = Game::new(Uuid::new_v4(), host, "hello", GameRules::default());
        assert_eq!(empty.start(), Err(GameError::NoPlayers));

        let alice = player("alice");
        let mut game = game_with("hello", GameRules::default(), &[&alice]);
        game.start().unwrap();
        assert_eq!(game.status(), GameStatus::Active);
        assert_eq!(game.start(), Err(GameError::AlreadyStarted));

        game.force_end().unwrap();
        assert_eq!(game.start(), Err(GameError::AlreadyStarted));
    }

    #[test]
    fn test_guess_before_start_is_rejected() {
        let alice = player("alice");
        let mut game = game_with("hello", GameRules::default(), &[&alice]);

        let err = game.submit_guess(&alice, "world").unwrap_err();
        assert_eq!(
            err,
            GameError::NotActive {
                status: GameStatus::Waiting
            }
        );
        assert_eq!(game.session("alice").unwrap().guess_count(), 0);
    }

    #[test]
    fn test_unknown_player_rejected_without_late_join() {
        let alice = player("alice");
        let mallory = player("mallory");
        let mut game = game_with("hello", GameRules::default(), &[&alice]);
        game.start().unwrap();

        let err = game.submit_guess(&mallory, "world").unwrap_err();
        assert_eq!(err, GameError::UnknownPlayer("mallory".to_string()));
        assert!(!game.has_session("mallory"));
    }

    #[test]
    fn test_late_join_creates_session_on_first_guess() {
        let alice = player("alice");
        let carol = player("carol");
        let rules = GameRules {
            allow_late_join: true,
            ..GameRules::default()
        };
        let mut game = game_with("hello", rules, &[&alice]);
        game.start().unwrap();

        assert!(game.check_admission("carol").is_ok());
        game.submit_guess(&carol, "world").unwrap();
        assert_eq!(game.session("carol").unwrap().guess_count(), 1);
    }

    #[test]
    fn test_length_mismatch_is_not_recorded() {
        let alice = player("alice");
        let mut game = game_with("hello", GameRules::default(), &[&alice]);
        game.start().unwrap();

        let err = game.submit_guess(&alice, "hi").unwrap_err();
        assert!(matches!(err, GameError::LengthMismatch { expected: 5, actual: 2 }));
        assert_eq!(game.session("alice").unwrap().guess_count(), 0);
    }

    #[test]
    fn test_winning_guess_finishes_session_with_rank() {
        let alice = player("alice");
        let bob = player("bob");
        let mut game = game_with("hello", GameRules::default(), &[&alice, &bob]);
        game.start().unwrap();

        let miss = game.submit_guess(&alice, "world").unwrap();
        assert!(!miss.finished());
        assert_eq!(
            miss.guess.letter_statuses[3],
            LetterStatus::Correct,
            "l in slot 3 matches"
        );

        let win = game.submit_guess(&alice, "hello").unwrap();
        assert_eq!(win.rank, Some(1));
        assert!(!win.game_ended);
        assert_eq!(game.status(), GameStatus::Active);

        let session = game.session("alice").unwrap();
        assert!(session.is_finished());
        assert_eq!(session.rank(), Some(1));
    }

    #[test]
    fn test_finished_player_cannot_guess_again() {
        let alice = player("alice");
        let bob = player("bob");
        let mut game = game_with("hello", GameRules::default(), &[&alice, &bob]);
        game.start().unwrap();
        game.submit_guess(&alice, "hello").unwrap();

        let err = game.submit_guess(&alice, "world").unwrap_err();
        assert_eq!(err, GameError::PlayerFinished("alice".to_string()));
        assert_eq!(game.session("alice").unwrap().guess_count(), 1);
        assert_eq!(game.session("alice").unwrap().rank(), Some(1));
    }

    #[test]
    fn test_exhausting_guesses_finishes_session() {
        let alice = player("alice");
        let bob = player("bob");
        let rules = GameRules {
            max_guesses: 2,
            ..GameRules::default()
        };
        let mut game = game_with("hello", rules, &[&alice, &bob]);
        game.start().unwrap();

        assert!(game.submit_guess(&bob, "world").unwrap().rank.is_none());
        let last = game.submit_guess(&bob, "crane").unwrap();
        assert_eq!(last.rank, Some(1));
        assert!(!game.session("bob").unwrap().solved());
    }

    #[test]
    fn test_game_ends_when_every_session_finishes() {
        let alice = player("alice");
        let bob = player("bob");
        let mut game = game_with("hello", GameRules::default(), &[&alice, &bob]);
        game.start().unwrap();

        game.submit_guess(&bob, "hello").unwrap();
        assert_eq!(game.status(), GameStatus::Active);

        let outcome = game.submit_guess(&alice, "hello").unwrap();
        assert_eq!(outcome.rank, Some(2));
        assert!(outcome.game_ended);
        assert_eq!(game.status(), GameStatus::Ended);
        assert!(game.ended_at().is_some());

        let err = game.submit_guess(&alice, "hello").unwrap_err();
        assert_eq!(
            err,
            GameError::NotActive {
                status: GameStatus::Ended
            }
        );
    }

    #[test]
    fn test_ranks_follow_applied_order() {
        let players: Vec<Player> = (0..5).map(|i| player(&format!("p{i}"))).collect();
        let refs: Vec<&Player> = players.iter().collect();
        let rules = GameRules {
            max_guesses: 3,
            ..GameRules::default()
        };
        let mut game = game_with("hello", rules, &refs);
        game.start().unwrap();

        // interleave misses and wins; p3 runs out of guesses
        let script = [
            ("p3", "world"),
            ("p1", "hello"),
            ("p3", "world"),
            ("p4", "world"),
            ("p3", "world"),
            ("p0", "hello"),
            ("p4", "hello"),
            ("p2", "hello"),
        ];

        let mut ranks = Vec::new();
        for (name, word) in script {
            let p = players.iter().find(|p| p.username == name).unwrap();
            if let Some(rank) = game.submit_guess(p, word).unwrap().rank {
                ranks.push((name, rank));
            }
        }

        assert_eq!(
            ranks,
            vec![("p1", 1), ("p3", 2), ("p0", 3), ("p4", 4), ("p2", 5)]
        );
        assert_eq!(game.status(), GameStatus::Ended);
    }

    #[test]
    fn test_force_end_leaves_unfinished_sessions_unranked() {
        let alice = player("alice");
        let bob = player("bob");
        let mut game = game_with("hello", GameRules::default(), &[&alice, &bob]);
        game.start().unwrap();
        game.submit_guess(&alice, "hello").unwrap();

        game.force_end().unwrap();
        assert_eq!(game.status(), GameStatus::Ended);
        assert_eq!(game.session("bob").unwrap().rank(), None);
        assert!(game.session("bob").unwrap().finished_at().is_none());
        assert_eq!(game.force_end(), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn test_force_end_from_waiting() {
        let alice = player("alice");
        let mut game = game_with("hello", GameRules::default(), &[&alice]);
        game.force_end().unwrap();
        assert_eq!(game.status(), GameStatus::Ended);
        assert!(game.started_at().is_none());
    }

    #[test]
    fn test_admission_rules() {
        let alice = player("alice");
        let bob = player("bob");
        let mut game = game_with("hello", GameRules::default(), &[&alice]);

        assert_eq!(game.admit(&alice), Ok(false));
        game.start().unwrap();

        assert_eq!(game.check_admission("alice"), Ok(()));
        assert_eq!(game.admit(&bob), Err(GameError::CannotJoinOngoing));

        game.force_end().unwrap();
        assert_eq!(game.check_admission("alice"), Ok(()));
        assert_eq!(game.check_admission("bob"), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn test_restored_game_renders_like_the_original() {
        let alice = player("alice");
        let bob = player("bob");
        let mut game = game_with("hello", GameRules::default(), &[&alice, &bob]);
        game.start().unwrap();
        game.submit_guess(&alice, "hello").unwrap();
        game.submit_guess(&bob, "world").unwrap();
        game.force_end().unwrap();

        let record = GameRecord {
            id: game.id(),
            creator: game.creator().clone(),
            correct_word: game.correct_word().to_string(),
            rules: game.rules(),
            created_at: game.created_at(),
            started_at: game.started_at(),
            ended_at: game.ended_at(),
        };
        let restored = Game::restore(record, game.sessions().cloned());

        assert_eq!(restored.status(), GameStatus::Ended);
        assert_eq!(restored.finished_count(), 1);
        let before = game.snapshot_for("bob");
        let after = restored.snapshot_for("bob");
        assert_eq!(after.guesses, before.guesses);
        assert_eq!(after.game_performance, before.game_performance);
        assert_eq!(after.correct_word.as_deref(), Some("hello"));
    }
}
