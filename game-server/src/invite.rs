use dashmap::DashMap;
use rand::Rng;
use rand::distr::Alphanumeric;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use game_core::GameError;
use game_types::{GameId, Player};

pub const TOKEN_LENGTH: usize = 30;
pub const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Who an invite token admits, and where.
#[derive(Debug, Clone)]
pub struct Invite {
    pub player: Player,
    pub room_id: GameId,
    pub created_at: Instant,
}

/// Short-lived token -> (player, room) bindings.
///
/// Resolving does not consume a token; entries simply age out.
pub struct InviteStore {
    invites: DashMap<String, Invite>,
    max_lifetime: Duration,
}

impl InviteStore {
    pub fn new(max_lifetime: Duration) -> Self {
        Self {
            invites: DashMap::new(),
            max_lifetime,
        }
    }

    fn generate_token() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }

    pub fn issue(&self, player: Player, room_id: GameId) -> String {
        let token = Self::generate_token();
        debug!("Issued invite for {} to room {}", player.username, room_id);
        self.invites.insert(
            token.clone(),
            Invite {
                player,
                room_id,
                created_at: Instant::now(),
            },
        );
        token
    }

    /// Look up a token. Entries past their lifetime count as missing even if
    /// the cleanup task hasn't removed them yet.
    pub fn resolve(&self, token: &str) -> Result<Invite, GameError> {
        match self.invites.get(token) {
            Some(invite) if invite.created_at.elapsed() < self.max_lifetime => Ok(invite.clone()),
            _ => Err(GameError::TokenExpired),
        }
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.invites.len();
        let max_lifetime = self.max_lifetime;
        self.invites
            .retain(|_, invite| invite.created_at.elapsed() < max_lifetime);
        before.saturating_sub(self.invites.len())
    }

    pub fn len(&self) -> usize {
        self.invites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invites.is_empty()
    }
}

impl Default for InviteStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LIFETIME)
    }
}

/// Purge expired invites every `interval` until `shutdown` flips to true.
pub fn spawn_cleanup(
    store: Arc<InviteStore>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.purge_expired();
                    if removed > 0 {
                        info!("Purged {} expired invites", removed);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("Invite cleanup stopping");
                        break;
                    }
                }
            }
        }
    })
}
