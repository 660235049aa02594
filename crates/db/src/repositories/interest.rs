//! Express-interest repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pitchlane_common::{AppError, AppResult};
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect,
};

use super::{read_err, write_err};
use crate::entities::{
    express_interest::{self, InterestStatus},
    ExpressInterest,
};

/// Express-interest repository for database operations.
#[derive(Clone)]
pub struct InterestRepository {
    db: Arc<DatabaseConnection>,
}

impl InterestRepository {
    /// Create a new interest repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an interest by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<express_interest::Model>> {
        ExpressInterest::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Find an interest by its natural key.
    pub async fn find_by_triple(
        &self,
        investor_id: &str,
        founder_id: &str,
        video_id: &str,
    ) -> AppResult<Option<express_interest::Model>> {
        ExpressInterest::find()
            .filter(express_interest::Column::InvestorId.eq(investor_id))
            .filter(express_interest::Column::FounderId.eq(founder_id))
            .filter(express_interest::Column::VideoId.eq(video_id))
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Check whether any interest from the investor to the founder was accepted.
    pub async fn has_accepted(&self, investor_id: &str, founder_id: &str) -> AppResult<bool> {
        let found = ExpressInterest::find()
            .filter(express_interest::Column::InvestorId.eq(investor_id))
            .filter(express_interest::Column::FounderId.eq(founder_id))
            .filter(express_interest::Column::Status.eq(InterestStatus::Accepted))
            .one(self.db.as_ref())
            .await
            .map_err(read_err)?;
        Ok(found.is_some())
    }

    /// Interests received by a founder, newest first.
    pub async fn list_for_founder(
        &self,
        founder_id: &str,
        limit: u64,
    ) -> AppResult<Vec<express_interest::Model>> {
        ExpressInterest::find()
            .filter(express_interest::Column::FounderId.eq(founder_id))
            .order_by_desc(express_interest::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Interests sent by an investor, newest first.
    pub async fn list_for_investor(
        &self,
        investor_id: &str,
        limit: u64,
    ) -> AppResult<Vec<express_interest::Model>> {
        ExpressInterest::find()
            .filter(express_interest::Column::InvestorId.eq(investor_id))
            .order_by_desc(express_interest::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Insert an interest. A repeat of the same triple surfaces as a conflict.
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        model: express_interest::Model,
    ) -> AppResult<()> {
        ExpressInterest::insert(model.into_active_model())
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }

    /// Move an interest from `from` to `to`; fails if it is no longer in `from`.
    pub async fn set_status<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        from: InterestStatus,
        to: InterestStatus,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = ExpressInterest::update_many()
            .col_expr(express_interest::Column::Status, Expr::value(to))
            .col_expr(express_interest::Column::UpdatedAt, Expr::value(Some(at)))
            .filter(express_interest::Column::Id.eq(id))
            .filter(express_interest::Column::Status.eq(from))
            .exec(conn)
            .await
            .map_err(write_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict(format!("interest {id} is no longer {from:?}")));
        }
        Ok(())
    }
}
