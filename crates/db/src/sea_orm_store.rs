//! [`Store`] backed by `PostgreSQL` through sea-orm.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pitchlane_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::debug;

use crate::entities::{
    blocking, comment, conversation, express_interest, following, message, message_limit,
    notification, user, video, video_like,
};
use crate::repositories::{
    BlockingRepository, ConversationRepository, EngagementRepository, FollowingRepository,
    InterestRepository, InvestorRepository, MessageLimitRepository, MessageRepository,
    NotificationRepository, RevealRepository, SubscriptionRepository, UserProfileRepository,
    UserRepository, VideoRepository,
};
use crate::store::{Account, Change, Store, VideoQuery, VideoStats};

/// Sea-orm implementation of the persistence contract.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: Arc<DatabaseConnection>,
    users: UserRepository,
    profiles: UserProfileRepository,
    subscriptions: SubscriptionRepository,
    investors: InvestorRepository,
    following: FollowingRepository,
    blocking: BlockingRepository,
    videos: VideoRepository,
    engagement: EngagementRepository,
    reveals: RevealRepository,
    interests: InterestRepository,
    conversations: ConversationRepository,
    messages: MessageRepository,
    limits: MessageLimitRepository,
    notifications: NotificationRepository,
}

impl SeaOrmStore {
    /// Create a store over a connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            users: UserRepository::new(Arc::clone(&db)),
            profiles: UserProfileRepository::new(Arc::clone(&db)),
            subscriptions: SubscriptionRepository::new(Arc::clone(&db)),
            investors: InvestorRepository::new(Arc::clone(&db)),
            following: FollowingRepository::new(Arc::clone(&db)),
            blocking: BlockingRepository::new(Arc::clone(&db)),
            videos: VideoRepository::new(Arc::clone(&db)),
            engagement: EngagementRepository::new(Arc::clone(&db)),
            reveals: RevealRepository::new(Arc::clone(&db)),
            interests: InterestRepository::new(Arc::clone(&db)),
            conversations: ConversationRepository::new(Arc::clone(&db)),
            messages: MessageRepository::new(Arc::clone(&db)),
            limits: MessageLimitRepository::new(Arc::clone(&db)),
            notifications: NotificationRepository::new(Arc::clone(&db)),
            db,
        }
    }

    async fn apply(txn: &DatabaseTransaction, change: Change) -> AppResult<()> {
        match change {
            Change::InsertUser(model) => UserRepository::insert(txn, model).await,
            Change::SetAccountType {
                user_id,
                account_type,
                at,
            } => UserRepository::set_account_type(txn, &user_id, account_type, at).await,
            Change::SaveUserProfile(model) => UserProfileRepository::upsert(txn, model).await,
            Change::SaveSubscription(model) => SubscriptionRepository::upsert(txn, model).await,
            Change::SaveVerification(model) => {
                InvestorRepository::upsert_verification(txn, model).await
            }
            Change::SaveInvestorProfile(model) => {
                InvestorRepository::upsert_profile(txn, model).await
            }
            Change::InsertFollow(model) => FollowingRepository::insert(txn, model).await,
            Change::DeleteFollow {
                follower_id,
                following_id,
            } => FollowingRepository::delete_by_pair(txn, &follower_id, &following_id)
                .await
                .map(|_| ()),
            Change::DeleteFollowsBetween { user_a, user_b } => {
                FollowingRepository::delete_between(txn, &user_a, &user_b)
                    .await
                    .map(|_| ())
            }
            Change::InsertBlock(model) => BlockingRepository::insert(txn, model).await,
            Change::DeleteBlock {
                blocker_id,
                blocked_id,
            } => BlockingRepository::delete_by_pair(txn, &blocker_id, &blocked_id)
                .await
                .map(|_| ()),
            Change::InsertVideo(model) => VideoRepository::insert(txn, model).await,
            Change::InsertLike(model) => EngagementRepository::insert_like(txn, model).await,
            Change::DeleteLike { video_id, user_id } => {
                EngagementRepository::delete_like(txn, &video_id, &user_id)
                    .await
                    .map(|_| ())
            }
            Change::InsertComment(model) => EngagementRepository::insert_comment(txn, model).await,
            Change::UpsertReveal(model) => RevealRepository::upsert(txn, model).await,
            Change::InsertInterest(model) => InterestRepository::insert(txn, model).await,
            Change::SetInterestStatus { id, from, to, at } => {
                InterestRepository::set_status(txn, &id, from, to, at).await
            }
            Change::CreateConversation(model) => ConversationRepository::insert(txn, model).await,
            Change::TransitionConversation {
                id,
                from,
                to,
                is_revealed,
            } => ConversationRepository::transition(txn, &id, from, to, is_revealed).await,
            Change::DeleteConversation { id, expected } => {
                ConversationRepository::delete_in_status(txn, &id, expected).await
            }
            Change::InsertMessage(model) => {
                let conversation_id = model.conversation_id.clone();
                let at = model.created_at;
                MessageRepository::insert(txn, model).await?;
                ConversationRepository::touch(txn, &conversation_id, at).await
            }
            Change::MarkRead {
                conversation_id,
                reader_id,
                at,
            } => MessageRepository::mark_read(txn, &conversation_id, &reader_id, at)
                .await
                .map(|_| ()),
            Change::ReserveQuota(reservation) => {
                MessageLimitRepository::reserve(txn, &reservation).await
            }
            Change::Notify(model) => NotificationRepository::insert(txn, model).await,
        }
    }
}

#[async_trait]
impl Store for SeaOrmStore {
    async fn find_account(&self, user_id: &str) -> AppResult<Option<Account>> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Ok(None);
        };

        Ok(Some(Account {
            profile: self.profiles.find_by_user_id(user_id).await?,
            subscription: self.subscriptions.find_by_user_id(user_id).await?,
            verification: self.investors.find_verification(user_id).await?,
            investor_profile: self.investors.find_profile(user_id).await?,
            user,
        }))
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        self.users.find_by_username(username).await
    }

    async fn find_video(&self, id: &str) -> AppResult<Option<video::Model>> {
        self.videos.find_by_id(id).await
    }

    async fn list_videos(&self, query: &VideoQuery) -> AppResult<Vec<video::Model>> {
        self.videos.list(query).await
    }

    async fn count_videos_since(&self, user_id: &str, since: DateTime<Utc>) -> AppResult<u64> {
        self.videos.count_since(user_id, since).await
    }

    async fn video_stats(&self, video_id: &str) -> AppResult<VideoStats> {
        self.videos.stats(video_id).await
    }

    async fn find_like(
        &self,
        video_id: &str,
        user_id: &str,
    ) -> AppResult<Option<video_like::Model>> {
        self.engagement.find_like(video_id, user_id).await
    }

    async fn list_comments(
        &self,
        video_id: &str,
        limit: u64,
        since_id: Option<&str>,
    ) -> AppResult<Vec<comment::Model>> {
        self.engagement.list_comments(video_id, limit, since_id).await
    }

    async fn find_block(
        &self,
        blocker_id: &str,
        blocked_id: &str,
    ) -> AppResult<Option<blocking::Model>> {
        self.blocking.find_by_pair(blocker_id, blocked_id).await
    }

    async fn is_blocked_between(&self, user_a: &str, user_b: &str) -> AppResult<bool> {
        self.blocking.is_blocked_between(user_a, user_b).await
    }

    async fn list_blocking(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<blocking::Model>> {
        self.blocking.find_blocking(user_id, limit, until_id).await
    }

    async fn find_follow(
        &self,
        follower_id: &str,
        following_id: &str,
    ) -> AppResult<Option<following::Model>> {
        self.following.find_by_pair(follower_id, following_id).await
    }

    async fn count_followers(&self, user_id: &str) -> AppResult<u64> {
        self.following.count_followers(user_id).await
    }

    async fn is_revealed(&self, investor_id: &str, founder_id: &str) -> AppResult<bool> {
        self.reveals.is_revealed(investor_id, founder_id).await
    }

    async fn find_interest(&self, id: &str) -> AppResult<Option<express_interest::Model>> {
        self.interests.find_by_id(id).await
    }

    async fn find_interest_by_triple(
        &self,
        investor_id: &str,
        founder_id: &str,
        video_id: &str,
    ) -> AppResult<Option<express_interest::Model>> {
        self.interests
            .find_by_triple(investor_id, founder_id, video_id)
            .await
    }

    async fn has_accepted_interest(&self, investor_id: &str, founder_id: &str) -> AppResult<bool> {
        self.interests.has_accepted(investor_id, founder_id).await
    }

    async fn list_interests_for_founder(
        &self,
        founder_id: &str,
        limit: u64,
    ) -> AppResult<Vec<express_interest::Model>> {
        self.interests.list_for_founder(founder_id, limit).await
    }

    async fn list_interests_for_investor(
        &self,
        investor_id: &str,
        limit: u64,
    ) -> AppResult<Vec<express_interest::Model>> {
        self.interests.list_for_investor(investor_id, limit).await
    }

    async fn find_conversation(&self, id: &str) -> AppResult<Option<conversation::Model>> {
        self.conversations.find_by_id(id).await
    }

    async fn find_conversation_between(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> AppResult<Option<conversation::Model>> {
        self.conversations.find_between(user_a, user_b).await
    }

    async fn list_conversations(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<conversation::Model>> {
        self.conversations.list_for_user(user_id, limit).await
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<message::Model>> {
        self.messages.list(conversation_id, limit, until_id).await
    }

    async fn count_unread(&self, conversation_id: &str, reader_id: &str) -> AppResult<u64> {
        self.messages.count_unread(conversation_id, reader_id).await
    }

    async fn count_unread_total(&self, user_id: &str) -> AppResult<u64> {
        self.messages.count_unread_total(user_id).await
    }

    async fn find_message_limit(
        &self,
        user_id: &str,
        period: &str,
    ) -> AppResult<Option<message_limit::Model>> {
        self.limits.find(user_id, period).await
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<notification::Model>> {
        self.notifications
            .find_by_user(user_id, limit, until_id)
            .await
    }

    async fn commit(&self, changes: Vec<Change>) -> AppResult<()> {
        let count = changes.len();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for change in changes {
            if let Err(err) = Self::apply(&txn, change).await {
                debug!(error = %err, "Rolling back change batch");
                txn.rollback()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                return Err(err);
            }
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        debug!(changes = count, "Committed change batch");
        Ok(())
    }
}
