use anyhow::{Context, Result, anyhow};
use rand::Rng;
use std::collections::HashSet;
use std::path::Path;

pub const MIN_WORD_LENGTH: usize = 5;
pub const MAX_WORD_LENGTH: usize = 8;

/// Dictionary of playable words, lowercase, 5 to 8 letters.
#[derive(Debug, Clone, Default)]
pub struct WordValidator {
    valid_words: HashSet<String>,
}

impl WordValidator {
    /// Build from newline-separated text. Blank lines and `#` comments are skipped.
    pub fn from_word_list(word_list: &str) -> Self {
        let valid_words = word_list
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_lowercase)
            .filter(|word| {
                let len = word.chars().count();
                (MIN_WORD_LENGTH..=MAX_WORD_LENGTH).contains(&len)
                    && word.chars().all(|c| c.is_alphabetic())
            })
            .collect();

        Self { valid_words }
    }

    /// Load every `*.txt` file in `dir`.
    pub fn from_directory(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut combined = String::new();

        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("reading word directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "txt") {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading word file {}", path.display()))?;
                combined.push_str(&contents);
                combined.push('\n');
            }
        }

        let validator = Self::from_word_list(&combined);
        if validator.valid_words.is_empty() {
            return Err(anyhow!("no playable words found in {}", dir.display()));
        }

        tracing::info!(
            words = validator.valid_words.len(),
            directory = %dir.display(),
            "Loaded word lists"
        );
        Ok(validator)
    }

    /// Check if a word is in the dictionary (case insensitive)
    pub fn is_valid_word(&self, word: &str) -> bool {
        self.valid_words.contains(&word.trim().to_lowercase())
    }

    /// Check if word contains only alphabetic characters
    pub fn is_alphabetic(&self, word: &str) -> bool {
        word.chars().all(|c| c.is_alphabetic())
    }

    pub fn len(&self) -> usize {
        self.valid_words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid_words.is_empty()
    }

    /// Collect the words of one length into a pool targets are drawn from.
    pub fn target_pool(&self, length: usize) -> Result<TargetWords> {
        let mut words: Vec<String> = self
            .valid_words
            .iter()
            .filter(|word| word.chars().count() == length)
            .cloned()
            .collect();

        if words.is_empty() {
            return Err(anyhow!("No words available of length {}", length));
        }

        words.sort();
        Ok(TargetWords { words })
    }
}

/// Non-empty set of candidate target words of a single length.
#[derive(Debug, Clone)]
pub struct TargetWords {
    words: Vec<String>,
}

impl TargetWords {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn pick(&self) -> &str {
        let index = rand::rng().random_range(0..self.words.len());
        &self.words[index]
    }
}
