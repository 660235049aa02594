//! Builders shared by unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use pitchlane_common::{AppResult, ManualTimeSource};
use pitchlane_db::{
    Account, Change, MemoryStore, Store, VideoQuery, VideoStats,
    entities::{
        blocking, comment, conversation, express_interest, following, investor_profile,
        investor_verification::{self, VerificationStatus},
        message, message_limit, notification,
        subscription::{self, SubscriptionTier},
        user::{self, AccountType},
        user_profile,
        video::{self, VideoKind, VisibilityClass},
        video_like,
    },
};
use tokio::sync::Mutex;

use crate::realtime::RealtimeHub;
use crate::services::{ServiceContext, Services};
use crate::settings::PolicySettings;

/// Services over an in-memory store with a manual clock starting at [`t0`].
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualTimeSource>,
    pub hub: Arc<RealtimeHub>,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(PolicySettings::default())
    }

    pub fn with_settings(settings: PolicySettings) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::over(store.clone(), store, settings)
    }

    /// Services writing through an [`InterleavingStore`]; seeding bypasses it.
    pub fn interleaved() -> (Self, Arc<InterleavingStore>) {
        let store = Arc::new(MemoryStore::new());
        let interleaving = Arc::new(InterleavingStore::new(store.clone()));
        let harness = Self::over(store, interleaving.clone(), PolicySettings::default());
        (harness, interleaving)
    }

    fn over(
        store: Arc<MemoryStore>,
        services_store: Arc<dyn Store>,
        settings: PolicySettings,
    ) -> Self {
        let clock = Arc::new(ManualTimeSource::new(t0()));
        let hub = Arc::new(RealtimeHub::default());
        let ctx = ServiceContext::new(services_store, Arc::new(settings), clock.clone())
            .with_emitter(hub.clone());

        Self {
            store,
            clock,
            hub,
            services: Services::new(&ctx),
        }
    }

    /// Insert an account with every record it carries.
    pub async fn seed(&self, account: &Account) {
        let mut changes = vec![Change::InsertUser(account.user.clone())];
        changes.extend(account.profile.clone().map(Change::SaveUserProfile));
        changes.extend(account.subscription.clone().map(Change::SaveSubscription));
        changes.extend(account.verification.clone().map(Change::SaveVerification));
        changes.extend(
            account
                .investor_profile
                .clone()
                .map(Change::SaveInvestorProfile),
        );
        self.store.commit(changes).await.unwrap();
    }

    pub async fn seed_video(&self, video: &video::Model) {
        self.store
            .commit(vec![Change::InsertVideo(video.clone())])
            .await
            .unwrap();
    }
}

/// Store that lands a queued batch from "another request" right before the
/// next commit, between a service's reads and its write.
pub struct InterleavingStore {
    inner: Arc<MemoryStore>,
    queued: Mutex<Option<Vec<Change>>>,
}

impl InterleavingStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            queued: Mutex::new(None),
        }
    }

    /// Commit `changes` ahead of the next batch written through this store.
    pub async fn interleave(&self, changes: Vec<Change>) {
        *self.queued.lock().await = Some(changes);
    }
}

#[async_trait]
impl Store for InterleavingStore {
    async fn find_account(&self, user_id: &str) -> AppResult<Option<Account>> {
        self.inner.find_account(user_id).await
    }
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        self.inner.find_user_by_username(username).await
    }
    async fn find_video(&self, id: &str) -> AppResult<Option<video::Model>> {
        self.inner.find_video(id).await
    }
    async fn list_videos(&self, query: &VideoQuery) -> AppResult<Vec<video::Model>> {
        self.inner.list_videos(query).await
    }
    async fn count_videos_since(&self, user_id: &str, since: DateTime<Utc>) -> AppResult<u64> {
        self.inner.count_videos_since(user_id, since).await
    }
    async fn video_stats(&self, video_id: &str) -> AppResult<VideoStats> {
        self.inner.video_stats(video_id).await
    }
    async fn find_like(
        &self,
        video_id: &str,
        user_id: &str,
    ) -> AppResult<Option<video_like::Model>> {
        self.inner.find_like(video_id, user_id).await
    }
    async fn list_comments(
        &self,
        video_id: &str,
        limit: u64,
        since_id: Option<&str>,
    ) -> AppResult<Vec<comment::Model>> {
        self.inner.list_comments(video_id, limit, since_id).await
    }
    async fn find_block(
        &self,
        blocker_id: &str,
        blocked_id: &str,
    ) -> AppResult<Option<blocking::Model>> {
        self.inner.find_block(blocker_id, blocked_id).await
    }
    async fn is_blocked_between(&self, user_a: &str, user_b: &str) -> AppResult<bool> {
        self.inner.is_blocked_between(user_a, user_b).await
    }
    async fn list_blocking(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<blocking::Model>> {
        self.inner.list_blocking(user_id, limit, until_id).await
    }
    async fn find_follow(
        &self,
        follower_id: &str,
        following_id: &str,
    ) -> AppResult<Option<following::Model>> {
        self.inner.find_follow(follower_id, following_id).await
    }
    async fn count_followers(&self, user_id: &str) -> AppResult<u64> {
        self.inner.count_followers(user_id).await
    }
    async fn is_revealed(&self, investor_id: &str, founder_id: &str) -> AppResult<bool> {
        self.inner.is_revealed(investor_id, founder_id).await
    }
    async fn find_interest(&self, id: &str) -> AppResult<Option<express_interest::Model>> {
        self.inner.find_interest(id).await
    }
    async fn find_interest_by_triple(
        &self,
        investor_id: &str,
        founder_id: &str,
        video_id: &str,
    ) -> AppResult<Option<express_interest::Model>> {
        self.inner
            .find_interest_by_triple(investor_id, founder_id, video_id)
            .await
    }
    async fn has_accepted_interest(&self, investor_id: &str, founder_id: &str) -> AppResult<bool> {
        self.inner.has_accepted_interest(investor_id, founder_id).await
    }
    async fn list_interests_for_founder(
        &self,
        founder_id: &str,
        limit: u64,
    ) -> AppResult<Vec<express_interest::Model>> {
        self.inner.list_interests_for_founder(founder_id, limit).await
    }
    async fn list_interests_for_investor(
        &self,
        investor_id: &str,
        limit: u64,
    ) -> AppResult<Vec<express_interest::Model>> {
        self.inner.list_interests_for_investor(investor_id, limit).await
    }
    async fn find_conversation(&self, id: &str) -> AppResult<Option<conversation::Model>> {
        self.inner.find_conversation(id).await
    }
    async fn find_conversation_between(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> AppResult<Option<conversation::Model>> {
        self.inner.find_conversation_between(user_a, user_b).await
    }
    async fn list_conversations(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<conversation::Model>> {
        self.inner.list_conversations(user_id, limit).await
    }
    async fn list_messages(
        &self,
        conversation_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<message::Model>> {
        self.inner.list_messages(conversation_id, limit, until_id).await
    }
    async fn count_unread(&self, conversation_id: &str, reader_id: &str) -> AppResult<u64> {
        self.inner.count_unread(conversation_id, reader_id).await
    }
    async fn count_unread_total(&self, user_id: &str) -> AppResult<u64> {
        self.inner.count_unread_total(user_id).await
    }
    async fn find_message_limit(
        &self,
        user_id: &str,
        period: &str,
    ) -> AppResult<Option<message_limit::Model>> {
        self.inner.find_message_limit(user_id, period).await
    }
    async fn list_notifications(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<notification::Model>> {
        self.inner.list_notifications(user_id, limit, until_id).await
    }
    async fn commit(&self, changes: Vec<Change>) -> AppResult<()> {
        let queued = self.queued.lock().await.take();
        if let Some(queued) = queued {
            self.inner.commit(queued).await?;
        }
        self.inner.commit(changes).await
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
}

pub fn account(id: &str, account_type: AccountType) -> Account {
    Account {
        user: user::Model {
            id: id.to_string(),
            username: id.to_string(),
            name: Some(format!("{id} name")),
            account_type,
            is_active: true,
            is_moderator: false,
            created_at: t0(),
            updated_at: None,
        },
        profile: Some(user_profile::Model {
            user_id: id.to_string(),
            headline: None,
            bio: None,
            avatar_url: None,
            allow_messages_from_everyone: true,
            updated_at: None,
        }),
        subscription: Some(subscription::Model {
            id: format!("sub-{id}"),
            user_id: id.to_string(),
            tier: SubscriptionTier::Free,
            current_period_end: None,
            created_at: t0(),
            updated_at: None,
        }),
        verification: None,
        investor_profile: None,
    }
}

pub fn investor(id: &str, status: VerificationStatus, public: bool) -> Account {
    let mut account = account(id, AccountType::Investor);
    account.verification = Some(investor_verification::Model {
        user_id: id.to_string(),
        status,
        submitted_at: None,
        reviewed_at: None,
        reviewed_by: None,
        review_note: None,
    });
    account.investor_profile = Some(investor_profile::Model {
        user_id: id.to_string(),
        firm_name: Some("Acme Ventures".to_string()),
        thesis: None,
        is_public_mode: public,
        show_firm_when_private: false,
        updated_at: None,
    });
    account
}

pub fn with_tier(mut account: Account, tier: SubscriptionTier) -> Account {
    if let Some(sub) = account.subscription.as_mut() {
        sub.tier = tier;
    }
    account
}

pub fn video(id: &str, owner: &str, visibility: VisibilityClass) -> video::Model {
    video::Model {
        id: id.to_string(),
        user_id: owner.to_string(),
        title: format!("{id} title"),
        description: None,
        kind: VideoKind::Pitch,
        visibility,
        duration_secs: 90,
        url: format!("https://cdn.example.com/{id}.mp4"),
        created_at: t0(),
    }
}
