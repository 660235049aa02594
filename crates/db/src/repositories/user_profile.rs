//! User profile repository.

use std::sync::Arc;

use pitchlane_common::AppResult;
use sea_orm::{
    sea_query::OnConflict, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
};

use super::{read_err, write_err};
use crate::entities::{user_profile, UserProfile};

/// User profile repository for database operations.
#[derive(Clone)]
pub struct UserProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl UserProfileRepository {
    /// Create a new user profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user profile by user ID.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<user_profile::Model>> {
        UserProfile::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Insert or replace a user profile.
    pub async fn upsert<C: ConnectionTrait>(
        conn: &C,
        model: user_profile::Model,
    ) -> AppResult<()> {
        UserProfile::insert(model.into_active_model())
            .on_conflict(
                OnConflict::column(user_profile::Column::UserId)
                    .update_columns([
                        user_profile::Column::Headline,
                        user_profile::Column::Bio,
                        user_profile::Column::AvatarUrl,
                        user_profile::Column::AllowMessagesFromEveryone,
                        user_profile::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }
}
