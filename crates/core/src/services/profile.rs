//! Profile service.

use pitchlane_common::AppResult;
use serde::Serialize;

use super::{RevealLedger, ServiceContext};
use crate::policy::PartyView;

/// A profile as shown to one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCard {
    pub profile: PartyView,
    pub followers: u64,
    pub is_following: bool,
}

#[derive(Clone)]
pub struct ProfileService {
    ctx: ServiceContext,
    reveals: RevealLedger,
}

impl ProfileService {
    #[must_use]
    pub const fn new(ctx: ServiceContext, reveals: RevealLedger) -> Self {
        Self { ctx, reveals }
    }

    /// Render `subject_id` for `viewer_id` (anonymous when `None`).
    ///
    /// Private investors come back redacted unless revealed to the viewer.
    pub async fn view(&self, viewer_id: Option<&str>, subject_id: &str) -> AppResult<ProfileCard> {
        let subject = self.ctx.account(subject_id).await?;
        let profile = self.reveals.view_of(&subject, viewer_id, false).await?;

        let followers = self.ctx.store.count_followers(subject_id).await?;
        let is_following = match viewer_id {
            Some(viewer_id) if viewer_id != subject_id => self
                .ctx
                .store
                .find_follow(viewer_id, subject_id)
                .await?
                .is_some(),
            _ => false,
        };

        Ok(ProfileCard {
            profile,
            followers,
            is_following,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::test_support::{Harness, account, investor};
    use pitchlane_db::entities::{
        investor_verification::VerificationStatus, user::AccountType,
    };

    #[tokio::test]
    async fn test_private_investor_redacted_until_revealed() {
        let h = Harness::new();
        let inv = investor("inv", VerificationStatus::Approved, false);
        let fdr = account("fdr", AccountType::Founder);
        h.seed(&inv).await;
        h.seed(&fdr).await;

        let card = h.services.profiles.view(Some("fdr"), "inv").await.unwrap();
        assert!(card.profile.is_redacted());
        assert_eq!(card.profile.id(), "inv");

        let anonymous = h.services.profiles.view(None, "inv").await.unwrap();
        assert!(anonymous.profile.is_redacted());

        let own = h.services.profiles.view(Some("inv"), "inv").await.unwrap();
        assert!(!own.profile.is_redacted());

        h.services.reveals.reveal("inv", "fdr").await.unwrap();
        let card = h.services.profiles.view(Some("fdr"), "inv").await.unwrap();
        assert!(!card.profile.is_redacted());
    }

    #[tokio::test]
    async fn test_follower_count_and_flag() {
        let h = Harness::new();
        h.seed(&account("fdr", AccountType::Founder)).await;
        h.seed(&account("bld", AccountType::Builder)).await;

        h.services.following.follow("bld", "fdr").await.unwrap();

        let card = h.services.profiles.view(Some("bld"), "fdr").await.unwrap();
        assert_eq!(card.followers, 1);
        assert!(card.is_following);

        let own = h.services.profiles.view(Some("fdr"), "fdr").await.unwrap();
        assert!(!own.is_following);
    }
}
