pub mod game_repository;
pub mod player_repository;

pub use game_repository::GameRepository;
pub use player_repository::PlayerRepository;

use anyhow::Result;
use async_trait::async_trait;
use game_core::Game;
use game_types::GameId;

/// Durable storage written when a game starts and when it ends, and read
/// back once its room is gone.
///
/// Callers pass a stable view of the game; implementations must not assume
/// they are called exactly once per transition.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn save_started_game(&self, game: &Game) -> Result<()>;
    async fn save_finished_game(&self, game: &Game) -> Result<()>;

    async fn find_game(&self, id: GameId) -> Result<Option<Game>>;

    /// Every stored game `username` took part in, newest first.
    async fn player_games(&self, username: &str) -> Result<Vec<Game>>;
}
