//! Video repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pitchlane_common::AppResult;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use super::{read_err, write_err};
use crate::entities::{
    comment, express_interest, video, video_like, Comment, ExpressInterest, Video, VideoLike,
};
use crate::store::{VideoQuery, VideoStats};

/// Video repository for database operations.
#[derive(Clone)]
pub struct VideoRepository {
    db: Arc<DatabaseConnection>,
}

impl VideoRepository {
    /// Create a new video repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a video by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<video::Model>> {
        Video::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// List videos newest first.
    ///
    /// A video matches when its visibility is in `query.visibility`, or when it
    /// belongs to `query.include_owned_by`.
    pub async fn list(&self, query: &VideoQuery) -> AppResult<Vec<video::Model>> {
        let mut audience =
            Condition::any().add(video::Column::Visibility.is_in(query.visibility.clone()));
        if let Some(owner) = &query.include_owned_by {
            audience = audience.add(video::Column::UserId.eq(owner.as_str()));
        }

        let mut select = Video::find()
            .filter(audience)
            .order_by_desc(video::Column::Id);

        if let Some(owner) = &query.owner_id {
            select = select.filter(video::Column::UserId.eq(owner.as_str()));
        }
        if let Some(kind) = query.kind {
            select = select.filter(video::Column::Kind.eq(kind));
        }
        if let Some(id) = &query.until_id {
            select = select.filter(video::Column::Id.lt(id.as_str()));
        }

        select
            .limit(query.limit)
            .all(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Count videos a user created at or after `since`.
    pub async fn count_since(&self, user_id: &str, since: DateTime<Utc>) -> AppResult<u64> {
        Video::find()
            .filter(video::Column::UserId.eq(user_id))
            .filter(video::Column::CreatedAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(read_err)
    }

    /// Engagement counters of a video.
    pub async fn stats(&self, video_id: &str) -> AppResult<VideoStats> {
        let likes = VideoLike::find()
            .filter(video_like::Column::VideoId.eq(video_id))
            .count(self.db.as_ref())
            .await
            .map_err(read_err)?;
        let comments = Comment::find()
            .filter(comment::Column::VideoId.eq(video_id))
            .count(self.db.as_ref())
            .await
            .map_err(read_err)?;
        let interests = ExpressInterest::find()
            .filter(express_interest::Column::VideoId.eq(video_id))
            .count(self.db.as_ref())
            .await
            .map_err(read_err)?;

        Ok(VideoStats {
            likes,
            comments,
            interests,
        })
    }

    /// Insert a video.
    pub async fn insert<C: ConnectionTrait>(conn: &C, model: video::Model) -> AppResult<()> {
        Video::insert(model.into_active_model())
            .exec_without_returning(conn)
            .await
            .map_err(write_err)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    #[tokio::test]
    async fn test_stats_collects_three_counters() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(4)]])
                .append_query_results([[count_row(2)]])
                .append_query_results([[count_row(1)]])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        let stats = repo.stats("v1").await.unwrap();

        assert_eq!(
            stats,
            VideoStats {
                likes: 4,
                comments: 2,
                interests: 1
            }
        );
    }

    #[tokio::test]
    async fn test_count_since() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(3)]])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        assert_eq!(repo.count_since("u1", Utc::now()).await.unwrap(), 3);
    }
}
