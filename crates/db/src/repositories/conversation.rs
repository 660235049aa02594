//! Conversation repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pitchlane_common::{AppError, AppResult};
use sea_orm::{
    sea_query::Expr, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect,
};

use super::{read_err, write_err};
use crate::entities::{
    conversation::{self, ConversationStatus},
    Conversation,
};

/// Conversation repository for database operations.
#[derive(Clone)]
pub struct ConversationRepository {
    db: Arc<DatabaseConnection>,
}

impl ConversationRepository {
    /// Create a new conversation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a conversation by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<conversation::Model>> {
        Conversation::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Find the conversation between two users, in either order.
    pub async fn find_between(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> AppResult<Option<conversation::Model>> {
        let pair_key = conversation::Model::pair_key_for(user_a, user_b);
        Conversation::find()
            .filter(conversation::Column::PairKey.eq(pair_key))
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Conversations a user takes part in, most recently active first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<conversation::Model>> {
        Conversation::find()
            .filter(
                Condition::any()
                    .add(conversation::Column::Participant1Id.eq(user_id))
                    .add(conversation::Column::Participant2Id.eq(user_id)),
            )
            .order_by_desc(conversation::Column::LastMessageAt)
            .order_by_desc(conversation::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Insert a conversation. A second conversation for the same pair surfaces as a conflict.
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        model: conversation::Model,
    ) -> AppResult<()> {
        Conversation::insert(model.into_active_model())
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }

    /// Move a conversation from `from` to `to`, optionally updating `is_revealed`.
    ///
    /// Fails with a conflict when the stored status is no longer `from`.
    pub async fn transition<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        from: ConversationStatus,
        to: ConversationStatus,
        is_revealed: Option<bool>,
    ) -> AppResult<()> {
        let mut update = Conversation::update_many()
            .col_expr(conversation::Column::Status, Expr::value(to))
            .filter(conversation::Column::Id.eq(id))
            .filter(conversation::Column::Status.eq(from));

        if let Some(revealed) = is_revealed {
            update = update.col_expr(conversation::Column::IsRevealed, Expr::value(revealed));
        }

        let result = update.exec(conn).await.map_err(write_err)?;
        if result.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "conversation {id} is no longer {from:?}"
            )));
        }
        Ok(())
    }

    /// Delete a conversation that is still in `expected` status.
    pub async fn delete_in_status<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        expected: ConversationStatus,
    ) -> AppResult<()> {
        let result = Conversation::delete_many()
            .filter(conversation::Column::Id.eq(id))
            .filter(conversation::Column::Status.eq(expected))
            .exec(conn)
            .await
            .map_err(write_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "conversation {id} is no longer {expected:?}"
            )));
        }
        Ok(())
    }

    /// Record the time of the latest message.
    pub async fn touch<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        Conversation::update_many()
            .col_expr(conversation::Column::LastMessageAt, Expr::value(Some(at)))
            .filter(conversation::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_conversation(a: &str, b: &str) -> conversation::Model {
        conversation::Model {
            id: "c1".to_string(),
            participant1_id: a.to_string(),
            participant2_id: b.to_string(),
            pair_key: conversation::Model::pair_key_for(a, b),
            status: ConversationStatus::Request,
            is_revealed: false,
            last_message_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_between_reversed_order() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_conversation("inv", "fdr")]])
                .into_connection(),
        );

        let repo = ConversationRepository::new(db);
        let found = repo.find_between("fdr", "inv").await.unwrap().unwrap();

        assert_eq!(found.participant1_id, "inv");
        assert!(found.has_participant("fdr"));
    }

    #[tokio::test]
    async fn test_transition_from_stale_status_conflicts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = ConversationRepository::transition(
            &db,
            "c1",
            ConversationStatus::Request,
            ConversationStatus::Active,
            Some(true),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_in_status() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        ConversationRepository::delete_in_status(&db, "c1", ConversationStatus::Request)
            .await
            .unwrap();
    }
}
