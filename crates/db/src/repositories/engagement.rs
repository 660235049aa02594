//! Engagement repository (video likes and comments).

use std::sync::Arc;

use pitchlane_common::AppResult;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect,
};

use super::{read_err, write_err};
use crate::entities::{comment, video_like, Comment, VideoLike};

/// Engagement repository for database operations.
#[derive(Clone)]
pub struct EngagementRepository {
    db: Arc<DatabaseConnection>,
}

impl EngagementRepository {
    /// Create a new engagement repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's like on a video.
    pub async fn find_like(
        &self,
        video_id: &str,
        user_id: &str,
    ) -> AppResult<Option<video_like::Model>> {
        VideoLike::find()
            .filter(video_like::Column::VideoId.eq(video_id))
            .filter(video_like::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// List comments on a video, oldest first.
    pub async fn list_comments(
        &self,
        video_id: &str,
        limit: u64,
        since_id: Option<&str>,
    ) -> AppResult<Vec<comment::Model>> {
        let mut query = Comment::find()
            .filter(comment::Column::VideoId.eq(video_id))
            .order_by_asc(comment::Column::Id);

        if let Some(id) = since_id {
            query = query.filter(comment::Column::Id.gt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Insert a like. A second like by the same user surfaces as a conflict.
    pub async fn insert_like<C: ConnectionTrait>(
        conn: &C,
        model: video_like::Model,
    ) -> AppResult<()> {
        VideoLike::insert(model.into_active_model())
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }

    /// Delete a user's like on a video.
    pub async fn delete_like<C: ConnectionTrait>(
        conn: &C,
        video_id: &str,
        user_id: &str,
    ) -> AppResult<u64> {
        let result = VideoLike::delete_many()
            .filter(video_like::Column::VideoId.eq(video_id))
            .filter(video_like::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(write_err)?;
        Ok(result.rows_affected)
    }

    /// Insert a comment.
    pub async fn insert_comment<C: ConnectionTrait>(
        conn: &C,
        model: comment::Model,
    ) -> AppResult<()> {
        Comment::insert(model.into_active_model())
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }
}
