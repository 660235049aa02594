//! Create express_interest table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExpressInterest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpressInterest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExpressInterest::InvestorId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpressInterest::FounderId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpressInterest::VideoId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpressInterest::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExpressInterest::Note).text())
                    .col(
                        ColumnDef::new(ExpressInterest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ExpressInterest::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_express_interest_investor")
                            .from(ExpressInterest::Table, ExpressInterest::InvestorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_express_interest_founder")
                            .from(ExpressInterest::Table, ExpressInterest::FounderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_express_interest_video")
                            .from(ExpressInterest::Table, ExpressInterest::VideoId)
                            .to(Video::Table, Video::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (investor_id, founder_id, video_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_express_interest_triple")
                    .table(ExpressInterest::Table)
                    .col(ExpressInterest::InvestorId)
                    .col(ExpressInterest::FounderId)
                    .col(ExpressInterest::VideoId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_express_interest_founder_id")
                    .table(ExpressInterest::Table)
                    .col(ExpressInterest::FounderId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExpressInterest::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ExpressInterest {
    Table,
    Id,
    InvestorId,
    FounderId,
    VideoId,
    Status,
    Note,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Video {
    Table,
    Id,
}
