use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{game_players, games, prelude::*};
use crate::repositories::{GameStore, PlayerRepository};
use game_core::{Game, GameRecord, GameRules, Guess, Session};
use game_types::{GameId, Player};

/// One entry of `game_players.played_words`.
#[derive(Debug, Serialize, Deserialize)]
struct PlayedWord {
    word: String,
    played_at: DateTime<Utc>,
}

pub struct GameRepository {
    db: DatabaseConnection,
}

impl GameRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn upsert_game<C: ConnectionTrait>(conn: &C, game: &Game, creator_id: String) -> Result<()> {
        let id = game.id().to_string();
        let started_at = game.started_at().map(Into::into);
        let ended_at = game.ended_at().map(Into::into);

        match Games::find_by_id(id.clone()).one(conn).await? {
            Some(existing) => {
                let mut active: games::ActiveModel = existing.into();
                active.started_at = ActiveValue::Set(started_at);
                active.ended_at = ActiveValue::Set(ended_at);
                active.update(conn).await?;
            }
            None => {
                let model = games::ActiveModel {
                    id: ActiveValue::Set(id),
                    creator_id: ActiveValue::Set(creator_id),
                    correct_word: ActiveValue::Set(game.correct_word().to_string()),
                    max_guesses: ActiveValue::Set(game.rules().max_guesses as i32),
                    created_at: ActiveValue::Set(game.created_at().into()),
                    started_at: ActiveValue::Set(started_at),
                    ended_at: ActiveValue::Set(ended_at),
                };
                Games::insert(model).exec_without_returning(conn).await?;
            }
        }

        Ok(())
    }

    async fn upsert_session<C: ConnectionTrait>(
        conn: &C,
        game_id: &str,
        player_id: String,
        session: &Session,
    ) -> Result<()> {
        let words: Vec<PlayedWord> = session
            .guesses()
            .iter()
            .map(|g| PlayedWord {
                word: g.word.clone(),
                played_at: g.played_at,
            })
            .collect();
        let played_words = serde_json::to_string(&words)?;
        let best = session.best_guess();
        let best_guess = best.map(|g| g.word.clone());
        let best_guess_time = best.map(|g| g.played_at.into());
        let finished_at = session.finished_at().map(Into::into);
        let rank = session.rank().map(|r| r as i32);

        let key = (game_id.to_string(), player_id.clone());
        match GamePlayers::find_by_id(key).one(conn).await? {
            Some(existing) => {
                let mut active: game_players::ActiveModel = existing.into();
                active.played_words = ActiveValue::Set(played_words);
                active.best_guess = ActiveValue::Set(best_guess);
                active.best_guess_time = ActiveValue::Set(best_guess_time);
                active.finished_at = ActiveValue::Set(finished_at);
                active.rank = ActiveValue::Set(rank);
                active.update(conn).await?;
            }
            None => {
                let model = game_players::ActiveModel {
                    game_id: ActiveValue::Set(game_id.to_string()),
                    player_id: ActiveValue::Set(player_id),
                    username: ActiveValue::Set(session.username().to_string()),
                    played_words: ActiveValue::Set(played_words),
                    best_guess: ActiveValue::Set(best_guess),
                    best_guess_time: ActiveValue::Set(best_guess_time),
                    finished_at: ActiveValue::Set(finished_at),
                    rank: ActiveValue::Set(rank),
                };
                GamePlayers::insert(model).exec_without_returning(conn).await?;
            }
        }

        Ok(())
    }

    /// Write the game and every session in one transaction.
    async fn write_game(&self, game: &Game) -> Result<()> {
        let txn = self.db.begin().await?;

        let creator_id = PlayerRepository::ensure_player(&txn, game.creator()).await?;
        Self::upsert_game(&txn, game, creator_id).await?;

        let game_id = game.id().to_string();
        for session in game.sessions() {
            let player_id = PlayerRepository::ensure_player(&txn, session.player()).await?;
            Self::upsert_session(&txn, &game_id, player_id, session).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    fn restore_session(row: game_players::Model, target: &str) -> Result<Session> {
        let played: Vec<PlayedWord> = serde_json::from_str(&row.played_words)
            .with_context(|| format!("corrupt played_words for {}", row.username))?;

        let guesses = played
            .into_iter()
            .map(|p| Guess::replay(p.word, p.played_at, target))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("stored guess for {} no longer scores", row.username))?;

        let player = Player::new(Uuid::parse_str(&row.player_id)?, row.username);
        Ok(Session::restore(
            player,
            guesses,
            row.finished_at.map(Into::into),
            row.rank.map(|r| r as u32),
        ))
    }

    /// Rebuild a [`Game`] from its row and its players' rows.
    async fn load_game<C: ConnectionTrait>(conn: &C, model: games::Model) -> Result<Game> {
        let creator = Players::find_by_id(model.creator_id.clone())
            .one(conn)
            .await?
            .ok_or_else(|| anyhow!("creator of game {} is missing", model.id))?;

        let rows = GamePlayers::find()
            .filter(game_players::Column::GameId.eq(model.id.as_str()))
            .all(conn)
            .await?;
        let sessions = rows
            .into_iter()
            .map(|row| Self::restore_session(row, &model.correct_word))
            .collect::<Result<Vec<_>>>()?;

        let record = GameRecord {
            id: Uuid::parse_str(&model.id)?,
            creator: Player::new(Uuid::parse_str(&creator.id)?, creator.username),
            correct_word: model.correct_word,
            rules: GameRules {
                max_guesses: model.max_guesses as usize,
                allow_late_join: false,
            },
            created_at: model.created_at.into(),
            started_at: model.started_at.map(Into::into),
            ended_at: model.ended_at.map(Into::into),
        };

        Ok(Game::restore(record, sessions))
    }
}

#[async_trait]
impl GameStore for GameRepository {
    async fn save_started_game(&self, game: &Game) -> Result<()> {
        self.write_game(game).await?;
        tracing::info!("Saved started game {}", game.id());
        Ok(())
    }

    async fn save_finished_game(&self, game: &Game) -> Result<()> {
        if game.ended_at().is_none() {
            return Err(anyhow!("game {} has not ended", game.id()));
        }

        self.write_game(game).await?;
        tracing::info!("Saved finished game {}", game.id());
        Ok(())
    }

    async fn find_game(&self, id: GameId) -> Result<Option<Game>> {
        match Games::find_by_id(id.to_string()).one(&self.db).await? {
            Some(model) => Ok(Some(Self::load_game(&self.db, model).await?)),
            None => Ok(None),
        }
    }

    async fn player_games(&self, username: &str) -> Result<Vec<Game>> {
        let Some(player) = PlayerRepository::find_by_username(&self.db, username).await? else {
            return Ok(Vec::new());
        };

        let game_ids: Vec<String> = GamePlayers::find()
            .filter(game_players::Column::PlayerId.eq(player.id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|row| row.game_id)
            .collect();

        let models = Games::find()
            .filter(games::Column::Id.is_in(game_ids))
            .order_by_desc(games::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let mut stored = Vec::with_capacity(models.len());
        for model in models {
            stored.push(Self::load_game(&self.db, model).await?);
        }
        tracing::debug!("Loaded {} stored games for {}", stored.len(), username);
        Ok(stored)
    }
}
