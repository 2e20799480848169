use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_players_table::Players;
use crate::m20240101_000002_create_games_table::Games;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GamePlayers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GamePlayers::GameId).string().not_null())
                    .col(ColumnDef::new(GamePlayers::PlayerId).string().not_null())
                    .col(ColumnDef::new(GamePlayers::Username).string().not_null())
                    // JSON array of words in submission order
                    .col(
                        ColumnDef::new(GamePlayers::PlayedWords)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(GamePlayers::BestGuess).string().null())
                    .col(
                        ColumnDef::new(GamePlayers::BestGuessTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GamePlayers::FinishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(GamePlayers::Rank).integer().null())
                    .primary_key(
                        Index::create()
                            .col(GamePlayers::GameId)
                            .col(GamePlayers::PlayerId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_players_game")
                            .from(GamePlayers::Table, GamePlayers::GameId)
                            .to(Games::Table, Games::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_players_player")
                            .from(GamePlayers::Table, GamePlayers::PlayerId)
                            .to(Players::Table, Players::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_players_player")
                    .table(GamePlayers::Table)
                    .col(GamePlayers::PlayerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GamePlayers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GamePlayers {
    Table,
    GameId,
    PlayerId,
    Username,
    PlayedWords,
    BestGuess,
    BestGuessTime,
    FinishedAt,
    Rank,
}
