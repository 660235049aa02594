//! Create investor_verification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InvestorVerification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InvestorVerification::UserId)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InvestorVerification::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(InvestorVerification::SubmittedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(InvestorVerification::ReviewedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(InvestorVerification::ReviewedBy).string_len(32))
                    .col(ColumnDef::new(InvestorVerification::ReviewNote).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_investor_verification_user")
                            .from(InvestorVerification::Table, InvestorVerification::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_investor_verification_status")
                    .table(InvestorVerification::Table)
                    .col(InvestorVerification::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InvestorVerification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum InvestorVerification {
    Table,
    UserId,
    Status,
    SubmittedAt,
    ReviewedAt,
    ReviewedBy,
    ReviewNote,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
