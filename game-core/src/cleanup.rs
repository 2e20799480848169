use game_types::GameStatus;
use std::time::Duration;

/// What the reaper should do with a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupAction {
    Keep,
    /// End the game, then flush it
    ForceEnd,
    /// Flushed and past its grace period; evict from the hub
    Close,
}

/// Elapsed times the reaper reads off a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomTimers {
    /// Since the room was created
    pub age: Duration,
    /// Since the last join, start or guess
    pub idle_for: Duration,
    /// Since the game ended; zero while it is still running
    pub ended_for: Duration,
}

/// Timeouts applied by the room reaper.
#[derive(Debug, Clone, Copy)]
pub struct CleanupPolicy {
    /// Max time a room may sit in Waiting
    pub waiting_timeout: Duration,
    /// Max time an Active room may go without activity
    pub idle_timeout: Duration,
    /// How long an Ended room stays queryable
    pub ended_grace: Duration,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            waiting_timeout: Duration::from_secs(30 * 60),
            idle_timeout: Duration::from_secs(10 * 60),
            ended_grace: Duration::from_secs(120),
        }
    }
}

impl CleanupPolicy {
    pub fn new(waiting_timeout: Duration, idle_timeout: Duration, ended_grace: Duration) -> Self {
        Self {
            waiting_timeout,
            idle_timeout,
            ended_grace,
        }
    }

    /// Decide based on status and the room's timers.
    ///
    /// Waiting rooms are measured from creation, so rejoining does not keep an
    /// unstarted room alive. Active rooms are measured from their last join,
    /// start or guess. `ended_for` only matters once the status is Ended.
    pub fn decide(&self, status: GameStatus, timers: RoomTimers) -> CleanupAction {
        match status {
            GameStatus::Waiting if timers.age >= self.waiting_timeout => CleanupAction::ForceEnd,
            GameStatus::Active if timers.idle_for >= self.idle_timeout => CleanupAction::ForceEnd,
            GameStatus::Ended if timers.ended_for >= self.ended_grace => CleanupAction::Close,
            _ => CleanupAction::Keep,
        }
    }
}
