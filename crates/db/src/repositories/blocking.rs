//! Blocking repository.

use std::sync::Arc;

use pitchlane_common::AppResult;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect,
};

use super::{read_err, write_err};
use crate::entities::{blocking, Blocking};

/// Blocking repository for database operations.
#[derive(Clone)]
pub struct BlockingRepository {
    db: Arc<DatabaseConnection>,
}

impl BlockingRepository {
    /// Create a new blocking repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a blocking relationship by blocker and blocked user.
    pub async fn find_by_pair(
        &self,
        blocker_id: &str,
        blocked_id: &str,
    ) -> AppResult<Option<blocking::Model>> {
        Blocking::find()
            .filter(blocking::Column::BlockerId.eq(blocker_id))
            .filter(blocking::Column::BlockedId.eq(blocked_id))
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Check if either user is blocking the other.
    pub async fn is_blocked_between(&self, user_a: &str, user_b: &str) -> AppResult<bool> {
        let found = Blocking::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(blocking::Column::BlockerId.eq(user_a))
                            .add(blocking::Column::BlockedId.eq(user_b)),
                    )
                    .add(
                        Condition::all()
                            .add(blocking::Column::BlockerId.eq(user_b))
                            .add(blocking::Column::BlockedId.eq(user_a)),
                    ),
            )
            .one(self.db.as_ref())
            .await
            .map_err(read_err)?;
        Ok(found.is_some())
    }

    /// Get users that a user is blocking (paginated).
    pub async fn find_blocking(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<blocking::Model>> {
        let mut query = Blocking::find()
            .filter(blocking::Column::BlockerId.eq(user_id))
            .order_by_desc(blocking::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(blocking::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Insert a block. A duplicate block surfaces as a conflict.
    pub async fn insert<C: ConnectionTrait>(conn: &C, model: blocking::Model) -> AppResult<()> {
        Blocking::insert(model.into_active_model())
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }

    /// Delete a block by pair.
    pub async fn delete_by_pair<C: ConnectionTrait>(
        conn: &C,
        blocker_id: &str,
        blocked_id: &str,
    ) -> AppResult<u64> {
        let result = Blocking::delete_many()
            .filter(blocking::Column::BlockerId.eq(blocker_id))
            .filter(blocking::Column::BlockedId.eq(blocked_id))
            .exec(conn)
            .await
            .map_err(write_err)?;
        Ok(result.rows_affected)
    }
}
