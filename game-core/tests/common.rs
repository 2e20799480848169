#![allow(dead_code)]

use game_core::{Game, GameRules, WordValidator};
use game_types::Player;

/// Creates a test WordValidator with a known set of words
pub fn create_test_validator() -> WordValidator {
    WordValidator::from_word_list(
        "apple\nbanana\ncherry\ntests\nvalid\nhello\nworld\nhouse\nmouse\ntrain\nplane\nwater\nstone\nbread\ncream\nalloy\nloyal\nspeed\nerase",
    )
}

pub fn create_test_player(name: &str) -> Player {
    Player::new(uuid::Uuid::new_v4(), name)
}

/// Creates a waiting game with the given players already admitted
pub fn create_game_with_word(players: &[Player], word: &str, rules: GameRules) -> Game {
    let mut game = Game::new(uuid::Uuid::new_v4(), players[0].clone(), word, rules);
    for player in players {
        game.admit(player).expect("admit in waiting room");
    }
    game
}

/// Two players, target "tests", already started
pub fn create_standard_game() -> (Game, Player, Player) {
    let alice = create_test_player("alice");
    let bob = create_test_player("bob");
    let mut game = create_game_with_word(&[alice.clone(), bob.clone()], "tests", GameRules::default());
    game.start().expect("start");
    (game, alice, bob)
}

pub fn submit_guesses(game: &mut Game, players: &[Player], guesses: &[(&str, &str)]) {
    for (name, word) in guesses {
        let player = players
            .iter()
            .find(|p| p.username == *name)
            .expect("player in list");
        game.submit_guess(player, word).expect("guess accepted");
    }
}
