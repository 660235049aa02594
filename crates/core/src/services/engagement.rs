//! Likes and comments on videos.

use std::collections::HashMap;

use pitchlane_common::{AppError, AppResult};
use pitchlane_db::{
    Account, Change,
    entities::{
        comment,
        notification::{NotificationPriority, NotificationType},
        user::AccountType,
        video_like,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::{Batch, MAX_PAGE, RevealLedger, ServiceContext};
use crate::policy::{Action, PartyView, Target, check_video_visibility, reveal};

/// Input for commenting on a video.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
}

/// A comment with its author as the viewer may see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub comment: comment::Model,
    pub author: PartyView,
}

#[derive(Clone)]
pub struct EngagementService {
    ctx: ServiceContext,
    reveals: RevealLedger,
}

impl EngagementService {
    #[must_use]
    pub const fn new(ctx: ServiceContext, reveals: RevealLedger) -> Self {
        Self { ctx, reveals }
    }

    /// Like a video. Returns `false` when it was already liked.
    pub async fn like(&self, user_id: &str, video_id: &str) -> AppResult<bool> {
        let actor = self.ctx.actor(user_id).await?;
        let video = self.ctx.video(video_id).await?;
        self.ctx
            .gate
            .can_act(&actor, Action::Like, &Target::Video(&video))?;

        if self.ctx.store.find_like(video_id, user_id).await?.is_some() {
            return Ok(false);
        }

        let now = self.ctx.now();
        let mut batch = Batch::new();
        batch.push(Change::InsertLike(video_like::Model {
            id: self.ctx.id_gen.generate_at(now),
            video_id: video_id.to_string(),
            user_id: user_id.to_string(),
            created_at: now,
        }));
        if video.user_id != user_id {
            batch.notify(self.ctx.notifier.draft(
                &video.user_id,
                NotificationType::VideoLiked,
                NotificationPriority::Low,
                "New like",
                format!("Someone liked \"{}\"", video.title),
                json!({ "videoId": video_id }),
                now,
            ));
        }

        match self.ctx.commit(batch).await {
            Ok(()) => Ok(true),
            Err(AppError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Remove a like. Unliking a video not liked is a no-op.
    pub async fn unlike(&self, user_id: &str, video_id: &str) -> AppResult<()> {
        self.ctx
            .store
            .commit(vec![Change::DeleteLike {
                video_id: video_id.to_string(),
                user_id: user_id.to_string(),
            }])
            .await
    }

    /// Comment on a video.
    ///
    /// A private investor commenting on a founder's video is revealed to
    /// that founder in the same commit.
    pub async fn comment(
        &self,
        user_id: &str,
        video_id: &str,
        input: CommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;
        let actor = self.ctx.actor(user_id).await?;
        let video = self.ctx.video(video_id).await?;
        self.ctx
            .gate
            .can_act(&actor, Action::Comment, &Target::Video(&video))?;

        let now = self.ctx.now();
        let model = comment::Model {
            id: self.ctx.id_gen.generate_at(now),
            video_id: video_id.to_string(),
            user_id: user_id.to_string(),
            text: input.text,
            created_at: now,
        };

        let mut batch = Batch::new();
        batch.push(Change::InsertComment(model.clone()));
        if video.user_id != user_id {
            let owner = self.ctx.account(&video.user_id).await?;
            if owner.account_type() == AccountType::Founder
                && reveal::needs_reveal(&actor.account, Some(owner.id()))
            {
                batch.push(self.reveals.record(user_id, owner.id()));
                tracing::debug!(investor_id = %user_id, founder_id = %owner.id(), "Revealed by comment");
            }
            batch.notify(self.ctx.notifier.draft(
                owner.id(),
                NotificationType::VideoCommented,
                NotificationPriority::Normal,
                "New comment",
                format!("New comment on \"{}\"", video.title),
                json!({ "videoId": video_id, "commentId": model.id }),
                now,
            ));
        }
        self.ctx.commit(batch).await?;

        Ok(model)
    }

    /// Comments on a video oldest first, with authors rendered for the viewer.
    pub async fn list_comments(
        &self,
        viewer_id: Option<&str>,
        video_id: &str,
        limit: u64,
        since_id: Option<&str>,
    ) -> AppResult<Vec<CommentView>> {
        let video = self.ctx.video(video_id).await?;
        let viewer = match viewer_id {
            Some(id) => Some(self.ctx.acting_account(id).await?),
            None => None,
        };
        check_video_visibility(viewer.as_ref(), &video)?;

        let comments = self
            .ctx
            .store
            .list_comments(video_id, limit.min(MAX_PAGE), since_id)
            .await?;

        let mut authors: HashMap<String, Account> = HashMap::new();
        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            if !authors.contains_key(&comment.user_id) {
                let author = self.ctx.account(&comment.user_id).await?;
                authors.insert(comment.user_id.clone(), author);
            }
            let Some(author) = authors.get(&comment.user_id) else {
                continue;
            };
            let author = self.reveals.view_of(author, viewer_id, false).await?;
            views.push(CommentView { comment, author });
        }
        Ok(views)
    }
}
