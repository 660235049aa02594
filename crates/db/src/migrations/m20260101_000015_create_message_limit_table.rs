//! Create message_limit table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MessageLimit::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MessageLimit::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MessageLimit::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MessageLimit::Period)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MessageLimit::Count).integer().not_null().default(0))
                    .col(ColumnDef::new(MessageLimit::ResetsAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_limit_user")
                            .from(MessageLimit::Table, MessageLimit::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, period) - one counter per period
        manager
            .create_index(
                Index::create()
                    .name("idx_message_limit_user_period")
                    .table(MessageLimit::Table)
                    .col(MessageLimit::UserId)
                    .col(MessageLimit::Period)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MessageLimit::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MessageLimit {
    Table,
    Id,
    UserId,
    Period,
    Count,
    ResetsAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
