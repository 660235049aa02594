//! Following service.

use pitchlane_common::{AppError, AppResult};
use pitchlane_db::{
    Change,
    entities::{
        following,
        notification::{NotificationPriority, NotificationType},
    },
};
use serde_json::json;

use super::{Batch, ServiceContext};
use crate::policy::{Action, Relationship, Target, reveal};

/// Result of a follow action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowResult {
    /// A new edge was created.
    Followed,
    /// The edge already existed; nothing changed.
    AlreadyFollowing,
}

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    ctx: ServiceContext,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Follow a user.
    ///
    /// Following twice is a no-op. Only the first follow notifies the target.
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> AppResult<FollowResult> {
        let actor = self.ctx.actor(follower_id).await?;
        let followee = self.ctx.account(followee_id).await?;

        let relationship = Relationship {
            blocked: self
                .ctx
                .store
                .is_blocked_between(follower_id, followee_id)
                .await?,
            ..Relationship::default()
        };
        self.ctx.gate.can_act(
            &actor,
            Action::Follow,
            &Target::User {
                account: &followee,
                relationship,
            },
        )?;

        if self
            .ctx
            .store
            .find_follow(follower_id, followee_id)
            .await?
            .is_some()
        {
            return Ok(FollowResult::AlreadyFollowing);
        }

        // Private investors follow without disclosing who they are.
        let (body, data) = if reveal::needs_reveal(&actor.account, Some(followee_id)) {
            (
                "A private investor followed you".to_string(),
                json!({}),
            )
        } else {
            (
                format!("@{} followed you", actor.account.user.username),
                json!({ "userId": follower_id }),
            )
        };

        let now = self.ctx.now();
        let mut batch = Batch::new();
        batch.push(Change::InsertFollow(following::Model {
            id: self.ctx.id_gen.generate_at(now),
            follower_id: follower_id.to_string(),
            following_id: followee_id.to_string(),
            created_at: now,
        }));
        batch.notify(self.ctx.notifier.draft(
            followee_id,
            NotificationType::NewFollower,
            NotificationPriority::Low,
            "New follower",
            body,
            data,
            now,
        ));

        match self.ctx.commit(batch).await {
            Ok(()) => {
                tracing::debug!(follower_id = %follower_id, followee_id = %followee_id, "Followed");
                Ok(FollowResult::Followed)
            }
            // Lost a race with an identical follow.
            Err(AppError::Conflict(_)) => Ok(FollowResult::AlreadyFollowing),
            Err(e) => Err(e),
        }
    }

    /// Unfollow a user. Unfollowing someone not followed is a no-op.
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> AppResult<()> {
        self.ctx
            .store
            .commit(vec![Change::DeleteFollow {
                follower_id: follower_id.to_string(),
                following_id: followee_id.to_string(),
            }])
            .await
    }

    /// Check if a user is following another user.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        Ok(self
            .ctx
            .store
            .find_follow(follower_id, followee_id)
            .await?
            .is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::realtime::RealtimeEvent;
    use crate::test_support::{Harness, account};
    use pitchlane_common::DenialReason;
    use pitchlane_db::{Store, entities::user::AccountType};

    async fn pair() -> Harness {
        let h = Harness::new();
        h.seed(&account("fdr", AccountType::Founder)).await;
        h.seed(&account("bld", AccountType::Builder)).await;
        h
    }

    #[tokio::test]
    async fn test_follow_is_idempotent_and_notifies_once() {
        let h = pair().await;
        let mut rx = h.hub.subscribe("fdr").await;

        let first = h.services.following.follow("bld", "fdr").await.unwrap();
        let second = h.services.following.follow("bld", "fdr").await.unwrap();

        assert_eq!(first, FollowResult::Followed);
        assert_eq!(second, FollowResult::AlreadyFollowing);
        assert!(h.services.following.is_following("bld", "fdr").await.unwrap());

        let RealtimeEvent::Notification {
            notification_type, ..
        } = rx.try_recv().unwrap();
        assert_eq!(notification_type, NotificationType::NewFollower);
        assert!(rx.try_recv().is_err());
        assert_eq!(
            h.store.list_notifications("fdr", 10, None).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_follow_denied_when_blocked() {
        let h = pair().await;
        h.services.blocking.block("fdr", "bld").await.unwrap();

        let err = h.services.following.follow("bld", "fdr").await.unwrap_err();
        let AppError::Forbidden(denial) = err else {
            panic!("expected a denial");
        };
        assert_eq!(denial.reason, DenialReason::Blocked);
    }

    #[tokio::test]
    async fn test_cannot_follow_self() {
        let h = pair().await;
        let err = h.services.following.follow("fdr", "fdr").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(d) if d.reason == DenialReason::Unsupported));
    }

    #[tokio::test]
    async fn test_unfollow_is_idempotent() {
        let h = pair().await;
        h.services.following.follow("bld", "fdr").await.unwrap();

        h.services.following.unfollow("bld", "fdr").await.unwrap();
        h.services.following.unfollow("bld", "fdr").await.unwrap();

        assert!(!h.services.following.is_following("bld", "fdr").await.unwrap());
    }

    #[tokio::test]
    async fn test_follow_unknown_user() {
        let h = pair().await;
        let err = h.services.following.follow("bld", "ghost").await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound(_)));
    }
}
