//! Subscription repository.

use std::sync::Arc;

use pitchlane_common::AppResult;
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter,
};

use super::{read_err, write_err};
use crate::entities::{subscription, Subscription};

/// Subscription repository for database operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the subscription of a user.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Insert a subscription, or replace the tier and period of the user's existing one.
    pub async fn upsert<C: ConnectionTrait>(
        conn: &C,
        model: subscription::Model,
    ) -> AppResult<()> {
        Subscription::insert(model.into_active_model())
            .on_conflict(
                OnConflict::column(subscription::Column::UserId)
                    .update_columns([
                        subscription::Column::Tier,
                        subscription::Column::CurrentPeriodEnd,
                        subscription::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }
}
