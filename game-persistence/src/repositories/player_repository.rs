use anyhow::Result;
use sea_orm::{ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::{players, prelude::*};
use game_types::Player;

pub struct PlayerRepository;

impl PlayerRepository {
    /// Make sure `player` has a row and return the id it is stored under.
    ///
    /// A username already registered under a different id keeps its
    /// original row.
    pub async fn ensure_player<C: ConnectionTrait>(conn: &C, player: &Player) -> Result<String> {
        let id = player.id.to_string();

        if let Some(existing) = Players::find_by_id(id.clone()).one(conn).await? {
            return Ok(existing.id);
        }

        if let Some(existing) = Players::find()
            .filter(players::Column::Username.eq(player.username.as_str()))
            .one(conn)
            .await?
        {
            tracing::debug!(
                "Username {} already stored under {}, reusing it",
                player.username,
                existing.id
            );
            return Ok(existing.id);
        }

        let model = players::ActiveModel {
            id: ActiveValue::Set(id.clone()),
            username: ActiveValue::Set(player.username.clone()),
            created_at: ActiveValue::Set(chrono::Utc::now().into()),
        };
        Players::insert(model).exec_without_returning(conn).await?;

        Ok(id)
    }

    pub async fn find_by_username<C: ConnectionTrait>(
        conn: &C,
        username: &str,
    ) -> Result<Option<players::Model>> {
        let model = Players::find()
            .filter(players::Column::Username.eq(username))
            .one(conn)
            .await?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_ensure_player_is_idempotent() {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let player = Player::new(Uuid::new_v4(), "alice");
        let first = PlayerRepository::ensure_player(&db, &player).await.unwrap();
        let second = PlayerRepository::ensure_player(&db, &player).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, player.id.to_string());

        let stored = PlayerRepository::find_by_username(&db, "alice").await.unwrap().unwrap();
        assert_eq!(stored.id, first);
    }

    #[tokio::test]
    async fn test_username_reused_under_original_id() {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let original = Player::new(Uuid::new_v4(), "bob");
        let impostor = Player::new(Uuid::new_v4(), "bob");

        let id = PlayerRepository::ensure_player(&db, &original).await.unwrap();
        let again = PlayerRepository::ensure_player(&db, &impostor).await.unwrap();
        assert_eq!(id, again);
    }
}
