//! Create profile_reveal table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProfileReveal::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProfileReveal::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProfileReveal::InvestorId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProfileReveal::FounderId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProfileReveal::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profile_reveal_investor")
                            .from(ProfileReveal::Table, ProfileReveal::InvestorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profile_reveal_founder")
                            .from(ProfileReveal::Table, ProfileReveal::FounderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (investor_id, founder_id) - reveals are idempotent
        manager
            .create_index(
                Index::create()
                    .name("idx_profile_reveal_investor_founder")
                    .table(ProfileReveal::Table)
                    .col(ProfileReveal::InvestorId)
                    .col(ProfileReveal::FounderId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProfileReveal::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ProfileReveal {
    Table,
    Id,
    InvestorId,
    FounderId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
