use chrono::{DateTime, SecondsFormat, Utc};
use game_types::{GameResponse, GameStatus, GuessResponse, LetterStatus, PlayerGuessResponse};

use crate::{Game, Guess, Session};

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn guess_response(guess: &Guess, reveal_word: bool) -> GuessResponse {
    GuessResponse {
        word: reveal_word.then(|| guess.word.clone()),
        played_at: timestamp(guess.played_at),
        status: LetterStatus::encode(&guess.letter_statuses),
    }
}

fn performance_entry(session: &Session, ended: bool) -> PlayerGuessResponse {
    PlayerGuessResponse {
        username: session.username().to_string(),
        guess_response: session.best_guess().map(|g| guess_response(g, ended)),
        rank_offset: session.rank(),
    }
}

impl Game {
    /// Project the game for one recipient.
    ///
    /// The recipient sees their own words. Other players' words and the
    /// target stay hidden until the game has ended; letter statuses are
    /// always visible.
    pub fn snapshot_for(&self, username: &str) -> GameResponse {
        let ended = self.status() == GameStatus::Ended;

        let guesses = self
            .session(username)
            .map(|s| s.guesses().iter().map(|g| guess_response(g, true)).collect())
            .unwrap_or_default();

        let mut sessions: Vec<&Session> = self.sessions().collect();
        // finished players by rank, then everybody else by name
        sessions.sort_by(|a, b| match (a.rank(), b.rank()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.username().cmp(b.username()),
        });

        GameResponse {
            id: self.id(),
            status: self.status(),
            created_at: timestamp(self.created_at()),
            started_at: self.started_at().map(timestamp),
            ended_at: self.ended_at().map(timestamp),
            creator: self.creator().username.clone(),
            word_length: self.word_length(),
            max_guesses: self.rules().max_guesses,
            correct_word: ended.then(|| self.correct_word().to_string()),
            guesses,
            game_performance: sessions
                .into_iter()
                .map(|s| performance_entry(s, ended))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::GameRules;
    use game_types::Player;
    use uuid::Uuid;

    use super::*;

    fn started_game(names: &[&str]) -> (Game, Vec<Player>) {
        let players: Vec<Player> = names.iter().map(|n| Player::new(Uuid::new_v4(), *n)).collect();
        let mut game = Game::new(Uuid::new_v4(), players[0].clone(), "hello", GameRules::default());
        for p in &players {
            game.admit(p).unwrap();
        }
        game.start().unwrap();
        (game, players)
    }

    #[test]
    fn test_own_words_visible_others_hidden() {
        let (mut game, players) = started_game(&["alice", "bob"]);
        game.submit_guess(&players[0], "world").unwrap();
        game.submit_guess(&players[1], "crane").unwrap();

        let view = game.snapshot_for("alice");
        assert_eq!(view.status, GameStatus::Active);
        assert!(view.correct_word.is_none());
        assert_eq!(view.guesses.len(), 1);
        assert_eq!(view.guesses[0].word.as_deref(), Some("world"));
        assert_eq!(view.guesses[0].status, vec![2, 1, 2, 0, 2]);

        assert_eq!(view.game_performance.len(), 2);
        for entry in &view.game_performance {
            let response = entry.guess_response.as_ref().unwrap();
            assert!(response.word.is_none(), "{} leaked", entry.username);
            assert_eq!(response.status.len(), 5);
        }
    }

    #[test]
    fn test_words_revealed_after_end() {
        let (mut game, players) = started_game(&["alice", "bob"]);
        game.submit_guess(&players[1], "crane").unwrap();
        game.force_end().unwrap();

        let view = game.snapshot_for("alice");
        assert_eq!(view.correct_word.as_deref(), Some("hello"));
        assert!(view.ended_at.is_some());
        assert!(view.guesses.is_empty());

        let bob = view
            .game_performance
            .iter()
            .find(|p| p.username == "bob")
            .unwrap();
        assert_eq!(
            bob.guess_response.as_ref().unwrap().word.as_deref(),
            Some("crane")
        );

        let alice = view
            .game_performance
            .iter()
            .find(|p| p.username == "alice")
            .unwrap();
        assert!(alice.guess_response.is_none());
    }

    #[test]
    fn test_performance_ordered_by_rank_then_name() {
        let (mut game, players) = started_game(&["dave", "carol", "bob", "alice"]);
        game.submit_guess(&players[2], "hello").unwrap(); // bob, rank 1
        game.submit_guess(&players[0], "hello").unwrap(); // dave, rank 2

        let view = game.snapshot_for("carol");
        let order: Vec<(&str, Option<u32>)> = view
            .game_performance
            .iter()
            .map(|p| (p.username.as_str(), p.rank_offset))
            .collect();

        assert_eq!(
            order,
            vec![
                ("bob", Some(1)),
                ("dave", Some(2)),
                ("alice", None),
                ("carol", None)
            ]
        );
    }

    #[test]
    fn test_snapshot_for_stranger_has_no_own_guesses() {
        let (mut game, players) = started_game(&["alice"]);
        game.submit_guess(&players[0], "world").unwrap();

        let view = game.snapshot_for("nobody");
        assert!(view.guesses.is_empty());
        assert_eq!(view.game_performance.len(), 1);
        assert_eq!(view.creator, "alice");
        assert_eq!(view.word_length, 5);
    }
}
