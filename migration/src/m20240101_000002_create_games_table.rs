use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_players_table::Players;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Games::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Games::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Games::CreatorId).string().not_null())
                    .col(ColumnDef::new(Games::CorrectWord).string().not_null())
                    .col(
                        ColumnDef::new(Games::MaxGuesses)
                            .integer()
                            .not_null()
                            .default(6),
                    )
                    .col(
                        ColumnDef::new(Games::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Games::StartedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Games::EndedAt).timestamp_with_time_zone().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_games_creator")
                            .from(Games::Table, Games::CreatorId)
                            .to(Players::Table, Players::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Finished-game history is read newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_games_ended_at")
                    .table(Games::Table)
                    .col(Games::EndedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Games::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Games {
    Table,
    Id,
    CreatorId,
    CorrectWord,
    MaxGuesses,
    CreatedAt,
    StartedAt,
    EndedAt,
}
