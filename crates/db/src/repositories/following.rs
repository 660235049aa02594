//! Following repository.

use std::sync::Arc;

use pitchlane_common::AppResult;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter,
};

use super::{read_err, write_err};
use crate::entities::{following, Following};

/// Following repository for database operations.
#[derive(Clone)]
pub struct FollowingRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowingRepository {
    /// Create a new following repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a following edge by follower and followee.
    pub async fn find_by_pair(
        &self,
        follower_id: &str,
        following_id: &str,
    ) -> AppResult<Option<following::Model>> {
        Following::find()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FollowingId.eq(following_id))
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Check if a user is following another user.
    pub async fn is_following(&self, follower_id: &str, following_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(follower_id, following_id).await?.is_some())
    }

    /// Count followers of a user.
    pub async fn count_followers(&self, user_id: &str) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::FollowingId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Insert a following edge. A duplicate edge surfaces as a conflict.
    pub async fn insert<C: ConnectionTrait>(conn: &C, model: following::Model) -> AppResult<()> {
        Following::insert(model.into_active_model())
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }

    /// Delete a following edge by pair.
    pub async fn delete_by_pair<C: ConnectionTrait>(
        conn: &C,
        follower_id: &str,
        following_id: &str,
    ) -> AppResult<u64> {
        let result = Following::delete_many()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FollowingId.eq(following_id))
            .exec(conn)
            .await
            .map_err(write_err)?;
        Ok(result.rows_affected)
    }

    /// Delete following edges in both directions between two users.
    pub async fn delete_between<C: ConnectionTrait>(
        conn: &C,
        user_a: &str,
        user_b: &str,
    ) -> AppResult<u64> {
        let result = Following::delete_many()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(following::Column::FollowerId.eq(user_a))
                            .add(following::Column::FollowingId.eq(user_b)),
                    )
                    .add(
                        Condition::all()
                            .add(following::Column::FollowerId.eq(user_b))
                            .add(following::Column::FollowingId.eq(user_a)),
                    ),
            )
            .exec(conn)
            .await
            .map_err(write_err)?;
        Ok(result.rows_affected)
    }
}
