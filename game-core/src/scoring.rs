use game_types::LetterStatus;
use std::collections::HashMap;

use crate::GameError;

pub struct ScoringEngine;

impl ScoringEngine {
    /// Evaluate a guess against the target word.
    ///
    /// Letters are compared exactly as given; case folding happens at the
    /// boundary before a word reaches the engine. A letter that appears `k`
    /// times in the target is marked `Correct` or `Present` at most `k` times.
    pub fn evaluate(guess: &str, target: &str) -> Result<Vec<LetterStatus>, GameError> {
        let guess_chars: Vec<char> = guess.chars().collect();
        let target_chars: Vec<char> = target.chars().collect();

        if guess_chars.len() != target_chars.len() {
            return Err(GameError::LengthMismatch {
                expected: target_chars.len(),
                actual: guess_chars.len(),
            });
        }

        // Remaining budget per letter, consumed by Correct first, then Present
        let mut remaining: HashMap<char, usize> = HashMap::new();
        for ch in &target_chars {
            *remaining.entry(*ch).or_insert(0) += 1;
        }

        let mut statuses = vec![LetterStatus::Absent; target_chars.len()];

        // First pass: exact positions
        for (i, (g, t)) in guess_chars.iter().zip(&target_chars).enumerate() {
            if g == t {
                statuses[i] = LetterStatus::Correct;
                if let Some(count) = remaining.get_mut(g) {
                    *count -= 1;
                }
            }
        }

        // Second pass: misplaced letters, left to right
        for (i, g) in guess_chars.iter().enumerate() {
            if statuses[i] == LetterStatus::Correct {
                continue;
            }
            match remaining.get_mut(g) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    statuses[i] = LetterStatus::Present;
                }
                _ => {}
            }
        }

        Ok(statuses)
    }

    /// True when every letter is in its exact slot.
    pub fn is_solved(statuses: &[LetterStatus]) -> bool {
        !statuses.is_empty() && statuses.iter().all(|s| *s == LetterStatus::Correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LetterStatus::{Absent, Correct, Present};

    fn marked_count(guess: &str, statuses: &[LetterStatus], letter: char) -> usize {
        guess
            .chars()
            .zip(statuses)
            .filter(|(c, s)| *c == letter && matches!(s, Correct | Present))
            .count()
    }

    #[test]
    fn test_evaluate_correct_word() {
        let statuses = ScoringEngine::evaluate("hello", "hello").unwrap();
        assert_eq!(statuses, vec![Correct; 5]);
        assert!(ScoringEngine::is_solved(&statuses));
    }

    #[test]
    fn test_evaluate_partial_match() {
        // w(absent) o(present) r(absent) l(correct) d(absent)
        let statuses = ScoringEngine::evaluate("world", "hello").unwrap();
        assert_eq!(statuses, vec![Absent, Present, Absent, Correct, Absent]);
        assert!(!ScoringEngine::is_solved(&statuses));
    }

    #[test]
    fn test_every_letter_misplaced() {
        let statuses = ScoringEngine::evaluate("loyal", "alloy").unwrap();
        assert_eq!(statuses, vec![Present; 5]);
    }

    #[test]
    fn test_duplicate_budget_is_exhausted() {
        // target has E twice, S and D once, no R or A
        let statuses = ScoringEngine::evaluate("erase", "speed").unwrap();
        assert_eq!(statuses, vec![Present, Absent, Absent, Present, Present]);
    }

    #[test]
    fn test_surplus_letters_are_absent() {
        // target has two l's; the one in slot 2 is correct, so only one more can be marked
        let statuses = ScoringEngine::evaluate("lllll", "hello").unwrap();
        assert_eq!(statuses, vec![Absent, Absent, Correct, Correct, Absent]);

        let statuses = ScoringEngine::evaluate("llama", "hello").unwrap();
        assert_eq!(statuses, vec![Present, Present, Absent, Absent, Absent]);
    }

    #[test]
    fn test_correct_takes_priority_over_earlier_present() {
        // the first e would be Present if scanned naively, but the only e is consumed by slot 4
        let statuses = ScoringEngine::evaluate("eerie", "crane").unwrap();
        assert_eq!(statuses, vec![Absent, Absent, Present, Absent, Correct]);
    }

    #[test]
    fn test_no_match() {
        let statuses = ScoringEngine::evaluate("zzzzz", "hello").unwrap();
        assert_eq!(statuses, vec![Absent; 5]);
    }

    #[test]
    fn test_mismatched_word_lengths() {
        assert_eq!(
            ScoringEngine::evaluate("hi", "hello"),
            Err(GameError::LengthMismatch {
                expected: 5,
                actual: 2
            })
        );
        assert!(ScoringEngine::evaluate("hellothere", "hello").is_err());
    }

    #[test]
    fn test_case_is_not_folded() {
        let statuses = ScoringEngine::evaluate("HELLO", "hello").unwrap();
        assert_eq!(statuses, vec![Absent; 5]);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let first = ScoringEngine::evaluate("erase", "speed").unwrap();
        for _ in 0..10 {
            assert_eq!(ScoringEngine::evaluate("erase", "speed").unwrap(), first);
        }
    }

    #[test]
    fn test_marks_never_exceed_target_letter_counts() {
        let words = [
            "speed", "erase", "alloy", "loyal", "hello", "llama", "eerie", "crane", "geese",
            "sheep", "level", "lever", "abbey", "babes", "mamma",
        ];

        for target in words {
            for guess in words {
                let statuses = ScoringEngine::evaluate(guess, target).unwrap();
                assert_eq!(statuses.len(), target.len());

                for (i, (g, t)) in guess.chars().zip(target.chars()).enumerate() {
                    if statuses[i] == Correct {
                        assert_eq!(g, t, "{guess} vs {target} at {i}");
                    } else {
                        assert_ne!(g, t, "{guess} vs {target} at {i}");
                    }
                }

                for letter in guess.chars() {
                    let in_target = target.chars().filter(|c| *c == letter).count();
                    assert!(
                        marked_count(guess, &statuses, letter) <= in_target,
                        "{guess} vs {target}: too many marks for {letter}"
                    );
                }
            }
        }
    }
}
