use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use game_core::{CleanupPolicy, GameRules};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub words_directory: String,
    pub word_length: usize,
    pub max_guesses: usize,
    pub allow_late_join: bool,
    pub case_insensitive_guesses: bool,
    pub require_dictionary_words: bool,
    pub invite_ttl_seconds: u64,
    pub invite_cleanup_seconds: u64,
    pub waiting_timeout_minutes: u64,
    pub idle_timeout_minutes: u64,
    pub ended_grace_seconds: u64,
    pub reaper_interval_seconds: u64,
    pub auth_dev_mode: bool,
    pub jwt_secret: Option<String>,
}

fn var_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: var_or("PORT", 8080)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://word_rooms.db?mode=rwc".to_string()),
            words_directory: env::var("WORDS_DIRECTORY")
                .unwrap_or_else(|_| "./shared/words".to_string()),
            word_length: var_or("WORD_LENGTH", 5)?,
            max_guesses: var_or("MAX_GUESSES", 6)?,
            allow_late_join: var_or("ALLOW_LATE_JOIN", false)?,
            case_insensitive_guesses: var_or("CASE_INSENSITIVE_GUESSES", true)?,
            require_dictionary_words: var_or("REQUIRE_DICTIONARY_WORDS", false)?,
            invite_ttl_seconds: var_or("INVITE_TTL_SECONDS", 3600)?,
            invite_cleanup_seconds: var_or("INVITE_CLEANUP_SECONDS", 60)?,
            waiting_timeout_minutes: var_or("WAITING_TIMEOUT_MINUTES", 30)?,
            idle_timeout_minutes: var_or("IDLE_TIMEOUT_MINUTES", 10)?,
            ended_grace_seconds: var_or("ENDED_GRACE_SECONDS", 120)?,
            reaper_interval_seconds: var_or("REAPER_INTERVAL_SECONDS", 30)?,
            auth_dev_mode: var_or("AUTH_DEV_MODE", false)?,
            jwt_secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
        })
    }

    pub fn game_rules(&self) -> GameRules {
        GameRules {
            max_guesses: self.max_guesses,
            allow_late_join: self.allow_late_join,
        }
    }

    pub fn hub_settings(&self) -> crate::hub::HubSettings {
        crate::hub::HubSettings {
            word_length: self.word_length,
            rules: self.game_rules(),
            case_insensitive: self.case_insensitive_guesses,
            require_dictionary_words: self.require_dictionary_words,
        }
    }

    pub fn cleanup_policy(&self) -> CleanupPolicy {
        CleanupPolicy::new(
            Duration::from_secs(self.waiting_timeout_minutes * 60),
            Duration::from_secs(self.idle_timeout_minutes * 60),
            Duration::from_secs(self.ended_grace_seconds),
        )
    }

    pub fn invite_ttl(&self) -> Duration {
        Duration::from_secs(self.invite_ttl_seconds)
    }

    pub fn invite_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.invite_cleanup_seconds.max(1))
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval_seconds.max(1))
    }
}
