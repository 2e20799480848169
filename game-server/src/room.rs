use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::websocket::connection::{Connection, ConnectionId};
use game_core::{Game, GameError, GuessOutcome, RoomTimers};
use game_types::{GameId, GameResponse, GameStatus, Player, ServerMessage};

/// Result of a guess applied to a room.
#[derive(Debug)]
pub struct GuessApplied {
    pub outcome: GuessOutcome,
    /// Copy of the game when this guess ended it, ready to be flushed
    pub finished_game: Option<Game>,
}

/// Point-in-time view used by the reaper.
#[derive(Debug, Clone, Copy)]
pub struct RoomActivity {
    pub status: GameStatus,
    pub closed: bool,
    pub timers: RoomTimers,
    pub persisted: bool,
}

struct RoomInner {
    game: Game,
    connections: HashMap<String, Connection>,
    closed: bool,
    created_instant: Instant,
    last_activity: Instant,
    ended_instant: Option<Instant>,
    persisted: bool,
}

impl RoomInner {
    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn mark_ended(&mut self) {
        if self.ended_instant.is_none() {
            self.ended_instant = Some(Instant::now());
        }
    }

    /// Queue a personalized snapshot for every connection.
    ///
    /// Queueing never waits on a socket; each connection's writer task does
    /// the network I/O. Connections that are gone or whose queue is full are
    /// dropped, and a full queue makes the writer hang up.
    fn broadcast(&mut self, room_id: GameId) {
        let mut dropped = Vec::new();

        for (username, conn) in &self.connections {
            let state = self.game.snapshot_for(username);
            if let Err(e) = conn.send(ServerMessage::GameState { state }) {
                warn!(%room_id, player = %username, "Dropping connection: {}", e);
                dropped.push(username.clone());
            }
        }

        for username in dropped {
            self.connections.remove(&username);
        }
    }
}

/// One live game plus the connections watching it.
///
/// Every operation takes the room lock for its whole critical section, so the
/// order in which guesses acquire it is the order used for ranking.
pub struct Room {
    id: GameId,
    inner: Mutex<RoomInner>,
}

impl Room {
    pub fn new(game: Game) -> Self {
        Self {
            id: game.id(),
            inner: Mutex::new(RoomInner {
                game,
                connections: HashMap::new(),
                closed: false,
                created_instant: Instant::now(),
                last_activity: Instant::now(),
                ended_instant: None,
                persisted: false,
            }),
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    fn ensure_open(&self, inner: &RoomInner) -> Result<(), GameError> {
        if inner.closed {
            Err(GameError::RoomClosed(self.id))
        } else {
            Ok(())
        }
    }

    /// Whether `username` could join right now, without changing anything.
    pub async fn can_join(&self, username: &str) -> Result<(), GameError> {
        let inner = self.inner.lock().await;
        self.ensure_open(&inner)?;
        inner.game.check_admission(username)
    }

    /// Attach `conn` for `player`, creating their session if needed.
    ///
    /// A previous connection for the same player is closed and replaced. The
    /// new connection immediately receives a full snapshot.
    pub async fn join(&self, player: &Player, conn: Connection) -> Result<(), GameError> {
        let mut inner = self.inner.lock().await;
        self.ensure_open(&inner)?;

        let created = inner.game.admit(player)?;
        inner.touch();

        let previous = inner.connections.insert(player.username.clone(), conn.clone());
        if let Some(previous) = previous.filter(|p| p.id() != conn.id()) {
            debug!(room_id = %self.id, player = %player.username, "Replacing connection {}", previous.id());
            previous.close("Connected from another location");
        }

        info!(
            room_id = %self.id,
            player = %player.username,
            new_session = created,
            "Player joined"
        );

        // Everyone else learns about the new player; the joiner gets their first snapshot
        inner.broadcast(self.id);
        Ok(())
    }

    /// Detach a connection. The session is kept so the player can come back.
    ///
    /// Only removes the entry if it still belongs to `conn_id`, so a stale
    /// socket closing late can't evict its replacement.
    pub async fn leave(&self, username: &str, conn_id: ConnectionId) -> bool {
        let mut inner = self.inner.lock().await;
        let matches = inner
            .connections
            .get(username)
            .is_some_and(|c| c.id() == conn_id);

        if matches {
            inner.connections.remove(username);
            info!(room_id = %self.id, player = %username, "Player left");
        }
        matches
    }

    /// Start the game. Only the creator may do this.
    pub async fn start(&self, by: &Player) -> Result<Game, GameError> {
        let mut inner = self.inner.lock().await;
        self.ensure_open(&inner)?;

        if inner.game.creator().username != by.username {
            return Err(GameError::NotCreator);
        }

        inner.game.start()?;
        inner.touch();
        info!(room_id = %self.id, players = inner.game.player_count(), "Game started");

        inner.broadcast(self.id);
        Ok(inner.game.clone())
    }

    pub async fn submit_guess(&self, player: &Player, word: &str) -> Result<GuessApplied, GameError> {
        let mut inner = self.inner.lock().await;
        self.ensure_open(&inner)?;

        let outcome = inner.game.submit_guess(player, word)?;
        inner.touch();

        debug!(
            room_id = %self.id,
            player = %player.username,
            rank = ?outcome.rank,
            "Guess applied"
        );

        let finished_game = if outcome.game_ended {
            inner.mark_ended();
            info!(room_id = %self.id, "Game ended, every player finished");
            Some(inner.game.clone())
        } else {
            None
        };

        inner.broadcast(self.id);
        Ok(GuessApplied {
            outcome,
            finished_game,
        })
    }

    /// End the game now, leaving unfinished players unranked.
    pub async fn force_end(&self) -> Result<Game, GameError> {
        let mut inner = self.inner.lock().await;
        self.ensure_open(&inner)?;

        inner.game.force_end()?;
        inner.mark_ended();
        info!(room_id = %self.id, "Game force-ended");

        inner.broadcast(self.id);
        Ok(inner.game.clone())
    }

    pub async fn snapshot_for(&self, username: &str) -> Result<GameResponse, GameError> {
        let inner = self.inner.lock().await;
        self.ensure_open(&inner)?;
        Ok(inner.game.snapshot_for(username))
    }

    /// Copy of the current game, for retrying a flush.
    pub async fn game(&self) -> Game {
        self.inner.lock().await.game.clone()
    }

    pub async fn status(&self) -> GameStatus {
        self.inner.lock().await.game.status()
    }

    pub async fn mark_persisted(&self) {
        self.inner.lock().await.persisted = true;
    }

    pub async fn activity(&self) -> RoomActivity {
        let inner = self.inner.lock().await;
        RoomActivity {
            status: inner.game.status(),
            closed: inner.closed,
            timers: RoomTimers {
                age: inner.created_instant.elapsed(),
                idle_for: inner.last_activity.elapsed(),
                ended_for: inner
                    .ended_instant
                    .map(|at| at.elapsed())
                    .unwrap_or_default(),
            },
            persisted: inner.persisted,
        }
    }

    #[cfg(test)]
    pub(crate) async fn connection_count(&self) -> usize {
        self.inner.lock().await.connections.len()
    }

    /// Mark the room closed and drop every connection.
    pub(crate) async fn close(&self, reason: &str) {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return;
        }

        inner.closed = true;
        for (_, conn) in inner.connections.drain() {
            conn.close(reason);
        }
        info!(room_id = %self.id, "Room closed");
    }
}
