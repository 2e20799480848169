mod common;

use common::*;
use game_core::{GameError, GameRules, ScoringEngine};
use game_types::{GameStatus, LetterStatus};

#[test]
fn test_game_creation() {
    let (game, _, _) = create_standard_game();
    assert_eq!(game.player_count(), 2);
    assert_eq!(game.status(), GameStatus::Active);
    assert_eq!(game.creator().username, "alice");
}

#[test]
fn test_word_validator() {
    let validator = create_test_validator();
    assert!(validator.is_valid_word("tests"));
    assert!(validator.is_valid_word("hello"));
    assert!(!validator.is_valid_word("invalid"));
}

#[test]
fn test_documented_scenarios() {
    assert_eq!(
        ScoringEngine::evaluate("loyal", "alloy").unwrap(),
        vec![LetterStatus::Present; 5]
    );
    assert_eq!(
        LetterStatus::encode(&ScoringEngine::evaluate("erase", "speed").unwrap()),
        vec![1, 2, 2, 1, 1]
    );
}

#[test]
fn test_full_game_flow() {
    let (mut game, alice, bob) = create_standard_game();
    let players = [alice.clone(), bob.clone()];

    submit_guesses(&mut game, &players, &[("alice", "house"), ("bob", "stone")]);
    assert_eq!(game.status(), GameStatus::Active);

    let outcome = game.submit_guess(&bob, "tests").unwrap();
    assert_eq!(outcome.rank, Some(1));

    let view = game.snapshot_for("alice");
    assert_eq!(view.guesses.len(), 1);
    assert!(view.correct_word.is_none());
    assert_eq!(view.game_performance[0].username, "bob");
    assert_eq!(view.game_performance[0].rank_offset, Some(1));
    assert!(view.game_performance[0]
        .guess_response
        .as_ref()
        .unwrap()
        .word
        .is_none());

    let outcome = game.submit_guess(&alice, "tests").unwrap();
    assert_eq!(outcome.rank, Some(2));
    assert!(outcome.game_ended);

    let view = game.snapshot_for("alice");
    assert_eq!(view.correct_word.as_deref(), Some("tests"));
    assert_eq!(
        view.game_performance[0]
            .guess_response
            .as_ref()
            .unwrap()
            .word
            .as_deref(),
        Some("tests")
    );
}

#[test]
fn test_rejections_do_not_mutate() {
    let (mut game, alice, bob) = create_standard_game();
    game.submit_guess(&alice, "tests").unwrap();

    assert_eq!(
        game.submit_guess(&alice, "world").unwrap_err(),
        GameError::PlayerFinished("alice".to_string())
    );
    assert!(matches!(
        game.submit_guess(&bob, "toolong").unwrap_err(),
        GameError::LengthMismatch { .. }
    ));

    assert_eq!(game.session("alice").unwrap().guess_count(), 1);
    assert_eq!(game.session("bob").unwrap().guess_count(), 0);
    assert_eq!(game.status(), GameStatus::Active);
}

#[test]
fn test_ranks_are_a_permutation() {
    let players: Vec<_> = (0..6).map(|i| create_test_player(&format!("player{i}"))).collect();
    let rules = GameRules {
        max_guesses: 2,
        ..GameRules::default()
    };
    let mut game = create_game_with_word(&players, "water", rules);
    game.start().unwrap();

    for round in 0..2 {
        for (i, player) in players.iter().enumerate() {
            if game.session(&player.username).unwrap().is_finished() {
                continue;
            }
            let word = if (i + round) % 3 == 0 { "water" } else { "stone" };
            game.submit_guess(player, word).unwrap();
        }
    }

    assert_eq!(game.status(), GameStatus::Ended);
    let mut ranks: Vec<u32> = game.sessions().filter_map(|s| s.rank()).collect();
    ranks.sort();
    assert_eq!(ranks, (1..=6).collect::<Vec<u32>>());
}
