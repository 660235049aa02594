//! Message limit repository (per-period quota counters).

use std::sync::Arc;

use pitchlane_common::{AppError, AppResult};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveValue::Set,
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

use super::{read_err, write_err};
use crate::entities::{message_limit, MessageLimit};
use crate::store::QuotaReservation;

/// Message limit repository for database operations.
#[derive(Clone)]
pub struct MessageLimitRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageLimitRepository {
    /// Create a new message limit repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the counter of a user for a period.
    pub async fn find(
        &self,
        user_id: &str,
        period: &str,
    ) -> AppResult<Option<message_limit::Model>> {
        MessageLimit::find()
            .filter(message_limit::Column::UserId.eq(user_id))
            .filter(message_limit::Column::Period.eq(period))
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Consume one unit of quota, or fail with [`AppError::QuotaExceeded`].
    ///
    /// Runs as three statements that only make sense inside a transaction:
    /// ensure the counter row exists, roll it over if `resets_at` has passed,
    /// then increment it only while it is below the cap.
    pub async fn reserve<C: ConnectionTrait>(
        conn: &C,
        reservation: &QuotaReservation,
    ) -> AppResult<()> {
        let seed = message_limit::ActiveModel {
            id: Set(reservation.id.clone()),
            user_id: Set(reservation.user_id.clone()),
            period: Set(reservation.period.clone()),
            count: Set(0),
            resets_at: Set(reservation.next_reset),
        };
        MessageLimit::insert(seed)
            .on_conflict(
                OnConflict::columns([message_limit::Column::UserId, message_limit::Column::Period])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;

        MessageLimit::update_many()
            .col_expr(message_limit::Column::Count, Expr::value(0))
            .col_expr(
                message_limit::Column::ResetsAt,
                Expr::value(reservation.next_reset),
            )
            .filter(message_limit::Column::UserId.eq(reservation.user_id.as_str()))
            .filter(message_limit::Column::Period.eq(reservation.period.as_str()))
            .filter(message_limit::Column::ResetsAt.lte(reservation.now))
            .exec(conn)
            .await
            .map_err(write_err)?;

        let cap = i32::try_from(reservation.cap).unwrap_or(i32::MAX);
        let incremented = MessageLimit::update_many()
            .col_expr(
                message_limit::Column::Count,
                Expr::col(message_limit::Column::Count).add(1),
            )
            .filter(message_limit::Column::UserId.eq(reservation.user_id.as_str()))
            .filter(message_limit::Column::Period.eq(reservation.period.as_str()))
            .filter(message_limit::Column::Count.lt(cap))
            .exec(conn)
            .await
            .map_err(write_err)?;

        if incremented.rows_affected > 0 {
            return Ok(());
        }

        let current = MessageLimit::find()
            .filter(message_limit::Column::UserId.eq(reservation.user_id.as_str()))
            .filter(message_limit::Column::Period.eq(reservation.period.as_str()))
            .one(conn)
            .await
            .map_err(read_err)?;

        Err(AppError::QuotaExceeded {
            message: format!("Monthly limit of {} investor messages reached", reservation.cap),
            resets_at: current.map_or(reservation.next_reset, |row| row.resets_at),
        })
    }
}
