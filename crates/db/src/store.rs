//! Persistence contract consumed by the interaction engine.
//!
//! Reads are plain lookups. Every mutation goes through [`Store::commit`],
//! which applies a batch of [`Change`]s all-or-nothing: a failing change
//! (a lost compare-and-set, a uniqueness violation, an exhausted quota)
//! leaves every entity in the batch untouched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pitchlane_common::AppResult;

use crate::entities::{
    blocking, comment,
    conversation::{self, ConversationStatus},
    express_interest::{self, InterestStatus},
    following, investor_profile,
    investor_verification::{self, VerificationStatus},
    message, message_limit, notification, profile_reveal, subscription,
    user::{self, AccountType},
    user_profile,
    video::{self, VideoKind, VisibilityClass},
    video_like,
};

/// A user together with the records the policy engine evaluates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub user: user::Model,
    pub profile: Option<user_profile::Model>,
    pub subscription: Option<subscription::Model>,
    pub verification: Option<investor_verification::Model>,
    pub investor_profile: Option<investor_profile::Model>,
}

impl Account {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.user.id
    }

    #[must_use]
    pub const fn account_type(&self) -> AccountType {
        self.user.account_type
    }

    /// Verification status; accounts without a record count as not submitted.
    #[must_use]
    pub fn verification_status(&self) -> VerificationStatus {
        self.verification
            .as_ref()
            .map_or(VerificationStatus::NotSubmitted, |v| v.status)
    }

    #[must_use]
    pub fn is_approved_investor(&self) -> bool {
        self.user.account_type == AccountType::Investor
            && self.verification_status() == VerificationStatus::Approved
    }

    /// Whether anyone may open a conversation with this user.
    #[must_use]
    pub fn allows_messages_from_everyone(&self) -> bool {
        self.profile
            .as_ref()
            .is_none_or(|p| p.allow_messages_from_everyone)
    }

    /// Whether this investor discloses their identity by default.
    ///
    /// Investors without a profile are private.
    #[must_use]
    pub fn is_public_mode(&self) -> bool {
        self.investor_profile
            .as_ref()
            .is_some_and(|p| p.is_public_mode)
    }
}

/// Filter for video listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoQuery {
    /// Restrict to one uploader.
    pub owner_id: Option<String>,
    /// Visibility classes the viewer may see.
    pub visibility: Vec<VisibilityClass>,
    /// Viewer whose own videos match regardless of class.
    pub include_owned_by: Option<String>,
    pub kind: Option<VideoKind>,
    pub until_id: Option<String>,
    pub limit: u64,
}

/// Engagement counters of a video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoStats {
    pub likes: u64,
    pub comments: u64,
    pub interests: u64,
}

/// An atomic reserve-or-reject request against a quota counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaReservation {
    /// Row id used when the counter does not exist yet.
    pub id: String,
    pub user_id: String,
    pub period: String,
    pub cap: u32,
    pub now: DateTime<Utc>,
    /// Reset time applied when the counter is created or rolled over.
    pub next_reset: DateTime<Utc>,
}

/// One mutation inside a [`Store::commit`] batch.
#[derive(Debug, Clone)]
pub enum Change {
    // === Accounts ===
    InsertUser(user::Model),
    SetAccountType {
        user_id: String,
        account_type: AccountType,
        at: DateTime<Utc>,
    },
    SaveUserProfile(user_profile::Model),
    SaveSubscription(subscription::Model),
    SaveVerification(investor_verification::Model),
    SaveInvestorProfile(investor_profile::Model),

    // === Social graph ===
    /// Fails with `Conflict` if the edge exists.
    InsertFollow(following::Model),
    DeleteFollow {
        follower_id: String,
        following_id: String,
    },
    /// Removes follow edges in both directions.
    DeleteFollowsBetween {
        user_a: String,
        user_b: String,
    },
    /// Fails with `Conflict` if the block exists.
    InsertBlock(blocking::Model),
    DeleteBlock {
        blocker_id: String,
        blocked_id: String,
    },

    // === Content ===
    InsertVideo(video::Model),
    /// Fails with `Conflict` if the user already likes the video.
    InsertLike(video_like::Model),
    DeleteLike {
        video_id: String,
        user_id: String,
    },
    InsertComment(comment::Model),

    // === Reveal / interest ===
    /// Idempotent per `(investor_id, founder_id)`.
    UpsertReveal(profile_reveal::Model),
    /// Fails with `Conflict` if the triple exists.
    InsertInterest(express_interest::Model),
    SetInterestStatus {
        id: String,
        from: InterestStatus,
        to: InterestStatus,
        at: DateTime<Utc>,
    },

    // === Conversations ===
    /// Fails with `Conflict` if the pair already has a conversation.
    CreateConversation(conversation::Model),
    /// Fails with `Conflict` unless the stored status is `from`.
    TransitionConversation {
        id: String,
        from: ConversationStatus,
        to: ConversationStatus,
        is_revealed: Option<bool>,
    },
    /// Fails with `Conflict` unless the stored status is `expected`.
    DeleteConversation {
        id: String,
        expected: ConversationStatus,
    },
    /// Also advances the conversation's `last_message_at`.
    InsertMessage(message::Model),
    MarkRead {
        conversation_id: String,
        reader_id: String,
        at: DateTime<Utc>,
    },

    // === Quota ===
    /// Fails the batch with `QuotaExceeded` when the counter is at its cap.
    ReserveQuota(QuotaReservation),

    // === Notifications ===
    Notify(notification::Model),
}

/// Transactional storage used by the services.
#[async_trait]
pub trait Store: Send + Sync {
    // === Accounts ===
    async fn find_account(&self, user_id: &str) -> AppResult<Option<Account>>;
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<user::Model>>;

    // === Content ===
    async fn find_video(&self, id: &str) -> AppResult<Option<video::Model>>;
    async fn list_videos(&self, query: &VideoQuery) -> AppResult<Vec<video::Model>>;
    async fn count_videos_since(&self, user_id: &str, since: DateTime<Utc>) -> AppResult<u64>;
    async fn video_stats(&self, video_id: &str) -> AppResult<VideoStats>;
    async fn find_like(
        &self,
        video_id: &str,
        user_id: &str,
    ) -> AppResult<Option<video_like::Model>>;
    async fn list_comments(
        &self,
        video_id: &str,
        limit: u64,
        since_id: Option<&str>,
    ) -> AppResult<Vec<comment::Model>>;

    // === Social graph ===
    async fn find_block(
        &self,
        blocker_id: &str,
        blocked_id: &str,
    ) -> AppResult<Option<blocking::Model>>;
    async fn is_blocked_between(&self, user_a: &str, user_b: &str) -> AppResult<bool>;
    async fn list_blocking(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<blocking::Model>>;
    async fn find_follow(
        &self,
        follower_id: &str,
        following_id: &str,
    ) -> AppResult<Option<following::Model>>;
    async fn count_followers(&self, user_id: &str) -> AppResult<u64>;

    // === Reveal / interest ===
    async fn is_revealed(&self, investor_id: &str, founder_id: &str) -> AppResult<bool>;
    async fn find_interest(&self, id: &str) -> AppResult<Option<express_interest::Model>>;
    async fn find_interest_by_triple(
        &self,
        investor_id: &str,
        founder_id: &str,
        video_id: &str,
    ) -> AppResult<Option<express_interest::Model>>;
    async fn has_accepted_interest(&self, investor_id: &str, founder_id: &str) -> AppResult<bool>;
    async fn list_interests_for_founder(
        &self,
        founder_id: &str,
        limit: u64,
    ) -> AppResult<Vec<express_interest::Model>>;
    async fn list_interests_for_investor(
        &self,
        investor_id: &str,
        limit: u64,
    ) -> AppResult<Vec<express_interest::Model>>;

    // === Conversations ===
    async fn find_conversation(&self, id: &str) -> AppResult<Option<conversation::Model>>;
    async fn find_conversation_between(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> AppResult<Option<conversation::Model>>;
    async fn list_conversations(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<conversation::Model>>;
    async fn list_messages(
        &self,
        conversation_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<message::Model>>;
    async fn count_unread(&self, conversation_id: &str, reader_id: &str) -> AppResult<u64>;
    async fn count_unread_total(&self, user_id: &str) -> AppResult<u64>;

    // === Quota ===
    async fn find_message_limit(
        &self,
        user_id: &str,
        period: &str,
    ) -> AppResult<Option<message_limit::Model>>;

    // === Notifications ===
    async fn list_notifications(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<notification::Model>>;

    /// Apply a batch of changes all-or-nothing.
    async fn commit(&self, changes: Vec<Change>) -> AppResult<()>;
}
