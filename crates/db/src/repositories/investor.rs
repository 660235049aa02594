//! Investor repository (verification records and investor profiles).

use std::sync::Arc;

use pitchlane_common::AppResult;
use sea_orm::{
    sea_query::OnConflict, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
};

use super::{read_err, write_err};
use crate::entities::{investor_profile, investor_verification, InvestorProfile, InvestorVerification};

/// Investor repository for database operations.
#[derive(Clone)]
pub struct InvestorRepository {
    db: Arc<DatabaseConnection>,
}

impl InvestorRepository {
    /// Create a new investor repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the verification record of a user.
    pub async fn find_verification(
        &self,
        user_id: &str,
    ) -> AppResult<Option<investor_verification::Model>> {
        InvestorVerification::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Find the investor profile of a user.
    pub async fn find_profile(&self, user_id: &str) -> AppResult<Option<investor_profile::Model>> {
        InvestorProfile::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Insert or replace a verification record.
    pub async fn upsert_verification<C: ConnectionTrait>(
        conn: &C,
        model: investor_verification::Model,
    ) -> AppResult<()> {
        InvestorVerification::insert(model.into_active_model())
            .on_conflict(
                OnConflict::column(investor_verification::Column::UserId)
                    .update_columns([
                        investor_verification::Column::Status,
                        investor_verification::Column::SubmittedAt,
                        investor_verification::Column::ReviewedAt,
                        investor_verification::Column::ReviewedBy,
                        investor_verification::Column::ReviewNote,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }

    /// Insert or replace an investor profile.
    pub async fn upsert_profile<C: ConnectionTrait>(
        conn: &C,
        model: investor_profile::Model,
    ) -> AppResult<()> {
        InvestorProfile::insert(model.into_active_model())
            .on_conflict(
                OnConflict::column(investor_profile::Column::UserId)
                    .update_columns([
                        investor_profile::Column::FirmName,
                        investor_profile::Column::Thesis,
                        investor_profile::Column::IsPublicMode,
                        investor_profile::Column::ShowFirmWhenPrivate,
                        investor_profile::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }
}
