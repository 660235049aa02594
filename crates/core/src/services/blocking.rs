//! Blocking service.
//!
//! A block in either direction vetoes messaging and following between the
//! pair. Blocking also removes follow edges both ways in the same commit.

use pitchlane_common::{AppError, AppResult};
use pitchlane_db::{Change, entities::blocking};

use super::{MAX_PAGE, ServiceContext};

/// Blocking service for business logic.
#[derive(Clone)]
pub struct BlockingService {
    ctx: ServiceContext,
}

impl BlockingService {
    /// Create a new blocking service.
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Block a user.
    ///
    /// Returns `false` when the block already existed.
    pub async fn block(&self, blocker_id: &str, blocked_id: &str) -> AppResult<bool> {
        if blocker_id == blocked_id {
            return Err(AppError::BadRequest("Cannot block yourself".to_string()));
        }
        self.ctx.account(blocked_id).await?;

        if self.is_blocking(blocker_id, blocked_id).await? {
            return Ok(false);
        }

        let now = self.ctx.now();
        let changes = vec![
            Change::InsertBlock(blocking::Model {
                id: self.ctx.id_gen.generate_at(now),
                blocker_id: blocker_id.to_string(),
                blocked_id: blocked_id.to_string(),
                created_at: now,
            }),
            Change::DeleteFollowsBetween {
                user_a: blocker_id.to_string(),
                user_b: blocked_id.to_string(),
            },
        ];

        match self.ctx.store.commit(changes).await {
            Ok(()) => {
                tracing::info!(blocker_id = %blocker_id, blocked_id = %blocked_id, "User blocked");
                Ok(true)
            }
            Err(AppError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Unblock a user. Unblocking someone not blocked is a no-op.
    ///
    /// Follow edges removed by the block are not restored.
    pub async fn unblock(&self, blocker_id: &str, blocked_id: &str) -> AppResult<()> {
        self.ctx
            .store
            .commit(vec![Change::DeleteBlock {
                blocker_id: blocker_id.to_string(),
                blocked_id: blocked_id.to_string(),
            }])
            .await
    }

    /// Check if a user is blocking another user.
    pub async fn is_blocking(&self, blocker_id: &str, blocked_id: &str) -> AppResult<bool> {
        Ok(self
            .ctx
            .store
            .find_block(blocker_id, blocked_id)
            .await?
            .is_some())
    }

    /// Check if either user is blocking the other.
    pub async fn is_blocked_between(&self, user_a: &str, user_b: &str) -> AppResult<bool> {
        self.ctx.store.is_blocked_between(user_a, user_b).await
    }

    /// Get users that a user is blocking (paginated, newest first).
    pub async fn get_blocking(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<blocking::Model>> {
        self.ctx
            .store
            .list_blocking(user_id, limit.min(MAX_PAGE), until_id)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::test_support::{Harness, account, t0};
    use pitchlane_common::AppError;
    use pitchlane_db::{
        Change, Store,
        entities::{blocking, user::AccountType},
    };

    #[tokio::test]
    async fn test_block_removes_follows_both_ways() {
        let h = Harness::new();
        h.seed(&account("fdr", AccountType::Founder)).await;
        h.seed(&account("bld", AccountType::Builder)).await;
        h.services.following.follow("bld", "fdr").await.unwrap();
        h.services.following.follow("fdr", "bld").await.unwrap();

        assert!(h.services.blocking.block("fdr", "bld").await.unwrap());

        assert!(!h.services.following.is_following("bld", "fdr").await.unwrap());
        assert!(!h.services.following.is_following("fdr", "bld").await.unwrap());
        assert!(h.services.blocking.is_blocked_between("bld", "fdr").await.unwrap());
        assert!(!h.services.blocking.is_blocking("bld", "fdr").await.unwrap());
    }

    #[tokio::test]
    async fn test_block_twice_is_noop() {
        let h = Harness::new();
        h.seed(&account("fdr", AccountType::Founder)).await;
        h.seed(&account("bld", AccountType::Builder)).await;

        assert!(h.services.blocking.block("fdr", "bld").await.unwrap());
        assert!(!h.services.blocking.block("fdr", "bld").await.unwrap());

        let listed = h.services.blocking.get_blocking("fdr", 10, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].blocked_id, "bld");
    }

    #[tokio::test]
    async fn test_unblock() {
        let h = Harness::new();
        h.seed(&account("fdr", AccountType::Founder)).await;
        h.seed(&account("bld", AccountType::Builder)).await;
        h.services.blocking.block("fdr", "bld").await.unwrap();

        h.services.blocking.unblock("fdr", "bld").await.unwrap();
        h.services.blocking.unblock("fdr", "bld").await.unwrap();

        assert!(!h.services.blocking.is_blocked_between("fdr", "bld").await.unwrap());
    }

    #[tokio::test]
    async fn test_cannot_block_self() {
        let h = Harness::new();
        h.seed(&account("fdr", AccountType::Founder)).await;
        let err = h.services.blocking.block("fdr", "fdr").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_blocking_page_is_capped() {
        let h = Harness::new();
        h.seed(&account("fdr", AccountType::Founder)).await;
        let blocks = (0..120)
            .map(|i| {
                Change::InsertBlock(blocking::Model {
                    id: format!("b{i:03}"),
                    blocker_id: "fdr".to_string(),
                    blocked_id: format!("user{i:03}"),
                    created_at: t0(),
                })
            })
            .collect();
        h.store.commit(blocks).await.unwrap();

        let listed = h
            .services
            .blocking
            .get_blocking("fdr", 1_000, None)
            .await
            .unwrap();
        assert_eq!(listed.len(), 100);
    }
}
