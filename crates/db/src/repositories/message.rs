//! Message repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pitchlane_common::AppResult;
use sea_orm::{
    sea_query::Expr, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
};

use super::{read_err, write_err};
use crate::entities::{conversation, message, Conversation, Message};

/// Message repository for database operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Messages of a conversation in creation order.
    ///
    /// With `until_id`, returns the `limit` messages immediately before it.
    pub async fn list(
        &self,
        conversation_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<message::Model>> {
        let mut query = Message::find()
            .filter(message::Column::ConversationId.eq(conversation_id))
            .order_by_desc(message::Column::CreatedAt)
            .order_by_desc(message::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(message::Column::Id.lt(id));
        }

        let mut messages = query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(read_err)?;
        messages.reverse();
        Ok(messages)
    }

    /// Unread messages in a conversation that the reader did not send.
    pub async fn count_unread(&self, conversation_id: &str, reader_id: &str) -> AppResult<u64> {
        Message::find()
            .filter(message::Column::ConversationId.eq(conversation_id))
            .filter(message::Column::SenderId.ne(reader_id))
            .filter(message::Column::ReadAt.is_null())
            .count(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Unread messages across every conversation of a user.
    pub async fn count_unread_total(&self, user_id: &str) -> AppResult<u64> {
        let conversations = Conversation::find()
            .select_only()
            .column(conversation::Column::Id)
            .filter(
                Condition::any()
                    .add(conversation::Column::Participant1Id.eq(user_id))
                    .add(conversation::Column::Participant2Id.eq(user_id)),
            )
            .into_query();

        Message::find()
            .filter(message::Column::ConversationId.in_subquery(conversations))
            .filter(message::Column::SenderId.ne(user_id))
            .filter(message::Column::ReadAt.is_null())
            .count(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Insert a message.
    pub async fn insert<C: ConnectionTrait>(conn: &C, model: message::Model) -> AppResult<()> {
        Message::insert(model.into_active_model())
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }

    /// Mark every unread message the reader did not send as read.
    pub async fn mark_read<C: ConnectionTrait>(
        conn: &C,
        conversation_id: &str,
        reader_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = Message::update_many()
            .col_expr(message::Column::ReadAt, Expr::value(Some(at)))
            .filter(message::Column::ConversationId.eq(conversation_id))
            .filter(message::Column::SenderId.ne(reader_id))
            .filter(message::Column::ReadAt.is_null())
            .exec(conn)
            .await
            .map_err(write_err)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_message(id: &str, sender: &str, offset_secs: i64) -> message::Model {
        message::Model {
            id: id.to_string(),
            conversation_id: "c1".to_string(),
            sender_id: sender.to_string(),
            content: Some("hello".to_string()),
            attachment_url: None,
            read_at: None,
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn test_list_returns_oldest_first() {
        // The query reads newest first; the page is flipped before returning.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_message("m2", "a", 10),
                    create_test_message("m1", "b", 0),
                ]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let messages = repo.list("c1", 20, None).await.unwrap();

        assert_eq!(
            messages.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            vec!["m1", "m2"]
        );
    }

    #[tokio::test]
    async fn test_mark_read_reports_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            }])
            .into_connection();

        let marked = MessageRepository::mark_read(&db, "c1", "a", Utc::now())
            .await
            .unwrap();
        assert_eq!(marked, 3);
    }
}
