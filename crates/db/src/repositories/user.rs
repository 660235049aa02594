//! User repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pitchlane_common::{AppError, AppResult};
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter,
};

use super::{read_err, write_err};
use crate::entities::{user, User};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Get a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find a user by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Insert a new user.
    pub async fn insert<C: ConnectionTrait>(conn: &C, model: user::Model) -> AppResult<()> {
        User::insert(model.into_active_model())
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }

    /// Change a user's account type.
    pub async fn set_account_type<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
        account_type: user::AccountType,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = User::update_many()
            .col_expr(user::Column::AccountType, Expr::value(account_type))
            .col_expr(user::Column::UpdatedAt, Expr::value(Some(at)))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(write_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::UserNotFound(user_id.to_string()));
        }
        Ok(())
    }
}
