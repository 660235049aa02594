//! Content service: video uploads, reads and analytics.

use pitchlane_common::{AppError, AppResult};
use pitchlane_db::{
    Change, VideoQuery, VideoStats,
    entities::video::{self, VideoKind, VisibilityClass},
};
use serde::Deserialize;
use validator::Validate;

use super::{MAX_PAGE, ServiceContext};
use crate::policy::{Action, Target, VideoDraft, check_video_visibility, resolve_visibility_classes};

/// Input for uploading a video.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UploadVideoInput {
    #[validate(length(min = 1, max = 140))]
    pub title: String,

    #[validate(length(max = 4096))]
    pub description: Option<String>,

    pub kind: VideoKind,

    pub visibility: VisibilityClass,

    #[validate(range(min = 1))]
    pub duration_secs: u32,

    #[validate(url)]
    pub url: String,
}

/// Input for listing videos.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListVideosInput {
    pub owner_id: Option<String>,
    pub kind: Option<VideoKind>,
    pub until_id: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Clone)]
pub struct ContentService {
    ctx: ServiceContext,
}

impl ContentService {
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Upload a video.
    ///
    /// Checked against the uploader allow-list for the kind, premium-only
    /// audiences and the daily posting cap counted from local midnight.
    pub async fn upload(&self, user_id: &str, input: UploadVideoInput) -> AppResult<video::Model> {
        input.validate()?;
        let max_duration = self.ctx.settings.max_video_duration_secs;
        if input.duration_secs > max_duration {
            return Err(AppError::Validation(format!(
                "Videos can be at most {max_duration} seconds long"
            )));
        }

        let actor = self.ctx.actor(user_id).await?;
        let now = self.ctx.now();
        let posts_today = self
            .ctx
            .store
            .count_videos_since(user_id, self.ctx.settings.day_start(now))
            .await?;
        let draft = VideoDraft {
            kind: input.kind,
            visibility: input.visibility,
            posts_today,
        };
        self.ctx
            .gate
            .can_act(&actor, Action::Upload, &Target::Draft(&draft))?;

        let model = video::Model {
            id: self.ctx.id_gen.generate_at(now),
            user_id: user_id.to_string(),
            title: input.title,
            description: input.description,
            kind: input.kind,
            visibility: input.visibility,
            duration_secs: i32::try_from(input.duration_secs)
                .map_err(|_| AppError::Validation("Video duration out of range".to_string()))?,
            url: input.url,
            created_at: now,
        };
        self.ctx
            .store
            .commit(vec![Change::InsertVideo(model.clone())])
            .await?;

        tracing::info!(video_id = %model.id, user_id = %user_id, kind = ?model.kind, "Video uploaded");
        Ok(model)
    }

    /// Get a video the viewer may watch. `None` is an anonymous viewer.
    pub async fn get(&self, viewer_id: Option<&str>, video_id: &str) -> AppResult<video::Model> {
        let video = self.ctx.video(video_id).await?;
        match viewer_id {
            Some(viewer_id) => {
                let actor = self.ctx.actor(viewer_id).await?;
                self.ctx
                    .gate
                    .can_act(&actor, Action::View, &Target::Video(&video))?;
            }
            None => check_video_visibility(None, &video)?,
        }
        Ok(video)
    }

    /// List videos visible to the viewer, newest first.
    pub async fn list(
        &self,
        viewer_id: Option<&str>,
        input: ListVideosInput,
    ) -> AppResult<Vec<video::Model>> {
        let viewer = match viewer_id {
            Some(id) => Some(self.ctx.acting_account(id).await?),
            None => None,
        };

        let query = VideoQuery {
            owner_id: input.owner_id,
            visibility: resolve_visibility_classes(viewer.as_ref().map(|v| v.account_type()))
                .to_vec(),
            include_owned_by: viewer_id.map(str::to_string),
            kind: input.kind,
            until_id: input.until_id,
            limit: input.limit.unwrap_or(20).min(MAX_PAGE),
        };
        let videos = self.ctx.store.list_videos(&query).await?;

        // The class filter is coarse; unapproved investors still fail per item.
        Ok(videos
            .into_iter()
            .filter(|v| check_video_visibility(viewer.as_ref(), v).is_ok())
            .collect())
    }

    /// Engagement counters for the uploader on a premium plan.
    pub async fn analytics(&self, user_id: &str, video_id: &str) -> AppResult<VideoStats> {
        let actor = self.ctx.actor(user_id).await?;
        let video = self.ctx.video(video_id).await?;
        self.ctx
            .gate
            .can_act(&actor, Action::ViewAnalytics, &Target::Video(&video))?;

        self.ctx.store.video_stats(video_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{Harness, account, investor, video, with_tier};
    use chrono::Duration;
    use pitchlane_common::DenialReason;
    use pitchlane_db::entities::{
        investor_verification::VerificationStatus, subscription::SubscriptionTier,
        user::AccountType,
    };

    fn upload(kind: VideoKind, visibility: VisibilityClass) -> UploadVideoInput {
        UploadVideoInput {
            title: "Our seed round".to_string(),
            description: None,
            kind,
            visibility,
            duration_secs: 60,
            url: "https://cdn.example.com/v.mp4".to_string(),
        }
    }

    fn denial(err: AppError) -> DenialReason {
        match err {
            AppError::Forbidden(denial) => denial.reason,
            other => panic!("expected a denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_daily_post_cap_resets_at_midnight() {
        let h = Harness::new();
        h.seed(&account("fdr", AccountType::Founder)).await;

        for _ in 0..3 {
            h.services
                .content
                .upload("fdr", upload(VideoKind::Pitch, VisibilityClass::Public))
                .await
                .unwrap();
        }
        let err = h
            .services
            .content
            .upload("fdr", upload(VideoKind::Pitch, VisibilityClass::Public))
            .await
            .unwrap_err();
        let AppError::Forbidden(d) = err else {
            panic!("expected a denial");
        };
        assert_eq!(d.reason, DenialReason::DailyPostLimit);
        assert_eq!(d.message, "Daily limit of 3 videos reached.");

        h.clock.advance(Duration::hours(12));
        h.services
            .content
            .upload("fdr", upload(VideoKind::Pitch, VisibilityClass::Public))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upload_role_and_premium_rules() {
        let h = Harness::new();
        h.seed(&account("bld", AccountType::Builder)).await;
        h.seed(&account("lrk", AccountType::Lurker)).await;
        h.seed(&with_tier(
            account("pro", AccountType::Founder),
            SubscriptionTier::FounderPro,
        ))
        .await;

        let err = h
            .services
            .content
            .upload("bld", upload(VideoKind::Pitch, VisibilityClass::Public))
            .await
            .unwrap_err();
        assert_eq!(denial(err), DenialReason::ContentTypeRestricted);

        let err = h
            .services
            .content
            .upload("lrk", upload(VideoKind::General, VisibilityClass::Public))
            .await
            .unwrap_err();
        assert_eq!(denial(err), DenialReason::AccountType);

        let err = h
            .services
            .content
            .upload("bld", upload(VideoKind::Demo, VisibilityClass::InvestorsOnly))
            .await
            .unwrap_err();
        assert_eq!(denial(err), DenialReason::PremiumRequired);

        h.services
            .content
            .upload("pro", upload(VideoKind::Pitch, VisibilityClass::InvestorsOnly))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upload_rejects_long_video() {
        let h = Harness::new();
        h.seed(&account("fdr", AccountType::Founder)).await;
        let mut input = upload(VideoKind::Pitch, VisibilityClass::Public);
        input.duration_secs = 301;

        let err = h.services.content.upload("fdr", input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_partitions_by_audience() {
        let h = Harness::new();
        h.seed(&account("fdr", AccountType::Founder)).await;
        h.seed(&account("bld", AccountType::Builder)).await;
        h.seed(&investor("ok", VerificationStatus::Approved, true)).await;
        h.seed(&investor("new", VerificationStatus::Pending, true)).await;
        h.seed_video(&video("pub", "fdr", VisibilityClass::Public)).await;
        h.seed_video(&video("com", "fdr", VisibilityClass::Community)).await;
        h.seed_video(&video("inv", "fdr", VisibilityClass::InvestorsOnly)).await;

        let ids = |videos: Vec<video::Model>| {
            let mut ids: Vec<String> = videos.into_iter().map(|v| v.id).collect();
            ids.sort();
            ids
        };
        let content = &h.services.content;

        assert_eq!(ids(content.list(None, ListVideosInput::default()).await.unwrap()), ["pub"]);
        assert_eq!(
            ids(content.list(Some("bld"), ListVideosInput::default()).await.unwrap()),
            ["com", "pub"]
        );
        assert_eq!(
            ids(content.list(Some("ok"), ListVideosInput::default()).await.unwrap()),
            ["inv", "pub"]
        );
        assert_eq!(
            ids(content.list(Some("new"), ListVideosInput::default()).await.unwrap()),
            ["pub"]
        );
        assert_eq!(
            ids(content.list(Some("fdr"), ListVideosInput::default()).await.unwrap()),
            ["com", "inv", "pub"]
        );
    }

    #[tokio::test]
    async fn test_get_checks_visibility() {
        let h = Harness::new();
        h.seed(&account("fdr", AccountType::Founder)).await;
        h.seed(&investor("new", VerificationStatus::Pending, true)).await;
        h.seed_video(&video("inv", "fdr", VisibilityClass::InvestorsOnly)).await;

        let err = h.services.content.get(None, "inv").await.unwrap_err();
        assert_eq!(denial(err), DenialReason::VisibilityRestricted);

        let err = h.services.content.get(Some("new"), "inv").await.unwrap_err();
        assert_eq!(denial(err), DenialReason::VerificationRequired);

        assert!(h.services.content.get(Some("fdr"), "inv").await.is_ok());
        assert!(matches!(
            h.services.content.get(None, "missing").await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_analytics_for_premium_owner() {
        let h = Harness::new();
        h.seed(&account("fdr", AccountType::Founder)).await;
        h.seed(&with_tier(
            account("pro", AccountType::Founder),
            SubscriptionTier::FounderPro,
        ))
        .await;
        h.seed_video(&video("v1", "fdr", VisibilityClass::Public)).await;
        h.seed_video(&video("v2", "pro", VisibilityClass::Public)).await;

        let err = h.services.content.analytics("fdr", "v1").await.unwrap_err();
        assert_eq!(denial(err), DenialReason::PremiumRequired);

        let err = h.services.content.analytics("pro", "v1").await.unwrap_err();
        assert_eq!(denial(err), DenialReason::NotOwner);

        h.services.engagement.like("fdr", "v2").await.unwrap();
        let stats = h.services.content.analytics("pro", "v2").await.unwrap();
        assert_eq!(stats.likes, 1);
        assert_eq!(stats.comments, 0);
    }
}
