use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::hub::Hub;
use crate::invite::{Invite, InviteStore};
use crate::room::Room;
use crate::websocket::connection::{Connection, ConnectionId};
use game_core::{CleanupAction, CleanupPolicy, Game, GameError, GuessOutcome};
use game_persistence::GameStore;
use game_types::{GameId, GameResponse, GameStatus, Player};

/// Operations the request layer can invoke on live rooms.
#[async_trait]
pub trait GameService: Send + Sync {
    async fn create_room(&self, creator: Player) -> Result<GameId, GameError>;

    /// Issue an invite after checking `player` could join `room_id`.
    async fn issue_invite(&self, player: Player, room_id: GameId) -> Result<String, GameError>;

    /// Resolve a token and re-check that its holder can still join.
    async fn redeem_invite(&self, token: &str) -> Result<Invite, GameError>;

    /// Live state of a room, or the stored game once the room is gone.
    async fn room_snapshot(&self, player: &Player, room_id: GameId) -> Result<GameResponse, GameError>;

    /// Every stored game `player` took part in, newest first.
    async fn player_rooms(&self, player: &Player) -> Result<Vec<GameResponse>, GameError>;

    async fn join(&self, room_id: GameId, player: &Player, conn: Connection) -> Result<(), GameError>;

    async fn leave(&self, room_id: GameId, username: &str, conn_id: ConnectionId);

    async fn start_game(&self, room_id: GameId, player: &Player) -> Result<(), GameError>;

    async fn submit_guess(
        &self,
        room_id: GameId,
        player: &Player,
        raw_word: &str,
    ) -> Result<GuessOutcome, GameError>;
}

fn storage_error(e: anyhow::Error) -> GameError {
    error!("Game store read failed: {:#}", e);
    GameError::Storage(e.to_string())
}

/// What one reaper pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReapReport {
    pub force_ended: usize,
    pub flushed: usize,
    pub closed: usize,
}

pub struct LiveService {
    hub: Arc<Hub>,
    invites: Arc<InviteStore>,
    store: Arc<dyn GameStore>,
}

impl LiveService {
    pub fn new(hub: Arc<Hub>, invites: Arc<InviteStore>, store: Arc<dyn GameStore>) -> Self {
        Self { hub, invites, store }
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    pub fn invites(&self) -> &Arc<InviteStore> {
        &self.invites
    }

    /// Flush a finished game. Failures are logged and leave the room
    /// unpersisted so the reaper tries again.
    async fn flush_finished(&self, room: &Room, game: &Game) -> bool {
        match self.store.save_finished_game(game).await {
            Ok(()) => {
                room.mark_persisted().await;
                true
            }
            Err(e) => {
                error!(room_id = %room.id(), "Failed to save finished game: {:#}", e);
                false
            }
        }
    }

    /// One sweep over every room using `policy`.
    pub async fn reap(&self, policy: &CleanupPolicy) -> ReapReport {
        let mut report = ReapReport::default();

        for room in self.hub.rooms() {
            let activity = room.activity().await;
            if activity.closed {
                continue;
            }

            match policy.decide(activity.status, activity.timers) {
                CleanupAction::ForceEnd => match room.force_end().await {
                    Ok(game) => {
                        info!(room_id = %room.id(), "Ending idle room");
                        report.force_ended += 1;
                        if self.flush_finished(&room, &game).await {
                            report.flushed += 1;
                        }
                    }
                    Err(e) => debug!(room_id = %room.id(), "Skipping force end: {}", e),
                },
                CleanupAction::Close if activity.persisted => {
                    if self.hub.close_room(room.id(), "Game over").await {
                        report.closed += 1;
                    }
                }
                _ if activity.status == GameStatus::Ended && !activity.persisted => {
                    let game = room.game().await;
                    if self.flush_finished(&room, &game).await {
                        report.flushed += 1;
                    }
                }
                _ => {}
            }
        }

        report
    }
}

#[async_trait]
impl GameService for LiveService {
    async fn create_room(&self, creator: Player) -> Result<GameId, GameError> {
        Ok(self.hub.create_room(creator))
    }

    async fn issue_invite(&self, player: Player, room_id: GameId) -> Result<String, GameError> {
        let room = self.hub.room(room_id)?;
        room.can_join(&player.username).await?;
        Ok(self.invites.issue(player, room_id))
    }

    async fn redeem_invite(&self, token: &str) -> Result<Invite, GameError> {
        let invite = self.invites.resolve(token).inspect_err(|_| {
            warn!("Rejected invite token");
        })?;
        let room = self.hub.room(invite.room_id)?;
        room.can_join(&invite.player.username).await?;
        Ok(invite)
    }

    async fn room_snapshot(&self, player: &Player, room_id: GameId) -> Result<GameResponse, GameError> {
        if let Some(room) = self.hub.get_room(room_id) {
            match room.snapshot_for(&player.username).await {
                Err(GameError::RoomClosed(_)) => {}
                other => return other,
            }
        }

        // stored games are only shown to the players who took part
        match self.store.find_game(room_id).await.map_err(storage_error)? {
            Some(game) if game.has_session(&player.username) => {
                Ok(game.snapshot_for(&player.username))
            }
            _ => Err(GameError::RoomNotFound(room_id)),
        }
    }

    async fn player_rooms(&self, player: &Player) -> Result<Vec<GameResponse>, GameError> {
        let stored = self
            .store
            .player_games(&player.username)
            .await
            .map_err(storage_error)?;

        let mut rooms = Vec::with_capacity(stored.len());
        for game in stored {
            // the live room is ahead of its stored copy
            let live = match self.hub.get_room(game.id()) {
                Some(room) => room.snapshot_for(&player.username).await.ok(),
                None => None,
            };
            rooms.push(live.unwrap_or_else(|| game.snapshot_for(&player.username)));
        }
        Ok(rooms)
    }

    async fn join(&self, room_id: GameId, player: &Player, conn: Connection) -> Result<(), GameError> {
        self.hub.room(room_id)?.join(player, conn).await
    }

    async fn leave(&self, room_id: GameId, username: &str, conn_id: ConnectionId) {
        if let Some(room) = self.hub.get_room(room_id) {
            room.leave(username, conn_id).await;
        }
    }

    async fn start_game(&self, room_id: GameId, player: &Player) -> Result<(), GameError> {
        let room = self.hub.room(room_id)?;
        let game = room.start(player).await?;

        // The game is already running for everyone; a failed save only loses the record
        if let Err(e) = self.store.save_started_game(&game).await {
            error!(%room_id, "Failed to save started game: {:#}", e);
        }
        Ok(())
    }

    async fn submit_guess(
        &self,
        room_id: GameId,
        player: &Player,
        raw_word: &str,
    ) -> Result<GuessOutcome, GameError> {
        let word = self.hub.prepare_guess(raw_word)?;
        let room = self.hub.room(room_id)?;
        let applied = room.submit_guess(player, &word).await?;

        if let Some(game) = applied.finished_game {
            self.flush_finished(&room, &game).await;
        }
        Ok(applied.outcome)
    }
}

/// Run [`LiveService::reap`] every `interval` until `shutdown` flips to true.
pub fn spawn_room_reaper(
    service: Arc<LiveService>,
    policy: CleanupPolicy,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = service.reap(&policy).await;
                    if report != ReapReport::default() {
                        info!(
                            force_ended = report.force_ended,
                            flushed = report.flushed,
                            closed = report.closed,
                            "Room reaper pass"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("Room reaper stopping");
                        break;
                    }
                }
            }
        }
    })
}
