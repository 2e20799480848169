pub use super::game_players::Entity as GamePlayers;
pub use super::games::Entity as Games;
pub use super::players::Entity as Players;
