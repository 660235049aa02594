//! Create investor_profile table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InvestorProfile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InvestorProfile::UserId)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InvestorProfile::FirmName).string_len(256))
                    .col(ColumnDef::new(InvestorProfile::Thesis).text())
                    .col(
                        ColumnDef::new(InvestorProfile::IsPublicMode)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(InvestorProfile::ShowFirmWhenPrivate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(InvestorProfile::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_investor_profile_user")
                            .from(InvestorProfile::Table, InvestorProfile::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InvestorProfile::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum InvestorProfile {
    Table,
    UserId,
    FirmName,
    Thesis,
    IsPublicMode,
    ShowFirmWhenPrivate,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
