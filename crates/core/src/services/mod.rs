//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod blocking;
pub mod content;
pub mod engagement;
pub mod following;
pub mod interest;
pub mod messaging;
pub mod notification;
pub mod profile;
pub mod quota;
pub mod reveal;

pub use account::{
    AccountService, RegisterAccountInput, UpdateInvestorProfileInput, UpdateProfileInput,
};
pub use blocking::BlockingService;
pub use content::{ContentService, ListVideosInput, UploadVideoInput};
pub use engagement::{CommentInput, CommentView, EngagementService};
pub use following::{FollowResult, FollowingService};
pub use interest::{ExpressInterestInput, InterestService, InterestView};
pub use messaging::{ConversationSummary, MessagingService, SendMessageInput, SentMessage};
pub use notification::{Batch, NotificationService, Notifier};
pub use profile::{ProfileCard, ProfileService};
pub use quota::{QuotaLedger, QuotaUsage};
pub use reveal::RevealLedger;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pitchlane_common::{AppError, AppResult, Clock, IdGenerator};
use pitchlane_db::{Account, Store, entities::video};

use crate::policy::{Actor, PermissionGate};
use crate::realtime::NotificationEmitter;
use crate::settings::PolicySettings;

/// Largest page any listing returns.
pub(crate) const MAX_PAGE: u64 = 100;

/// Collaborators shared by every service.
#[derive(Clone)]
pub struct ServiceContext {
    pub store: Arc<dyn Store>,
    pub settings: Arc<PolicySettings>,
    pub gate: PermissionGate,
    pub clock: Clock,
    pub notifier: Notifier,
    pub id_gen: IdGenerator,
}

impl ServiceContext {
    /// Create a context without realtime delivery.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, settings: Arc<PolicySettings>, clock: Clock) -> Self {
        Self {
            store,
            gate: PermissionGate::new(settings.clone()),
            settings,
            clock,
            notifier: Notifier::new(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Push committed notifications through `emitter`.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<dyn NotificationEmitter>) -> Self {
        self.notifier.set_emitter(emitter);
        self
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Load an account or fail with `UserNotFound`.
    pub async fn account(&self, user_id: &str) -> AppResult<Account> {
        self.store
            .find_account(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))
    }

    /// Load the account behind the calling identity.
    ///
    /// An identity with no account row is `Unauthorized`, not a missing target.
    pub async fn acting_account(&self, user_id: &str) -> AppResult<Account> {
        self.store
            .find_account(user_id)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Load the acting account with its premium status evaluated now.
    pub async fn actor(&self, user_id: &str) -> AppResult<Actor> {
        let account = self.acting_account(user_id).await?;
        Ok(Actor::new(account, &self.settings, self.now()))
    }

    /// Load a video or fail with `NotFound`.
    pub async fn video(&self, video_id: &str) -> AppResult<video::Model> {
        self.store
            .find_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {video_id}")))
    }

    /// Commit a batch and deliver its notifications.
    pub async fn commit(&self, batch: Batch) -> AppResult<()> {
        batch.commit(self.store.as_ref(), &self.notifier).await
    }
}

/// Every service, wired to one context.
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub profiles: ProfileService,
    pub following: FollowingService,
    pub blocking: BlockingService,
    pub content: ContentService,
    pub engagement: EngagementService,
    pub interests: InterestService,
    pub messaging: MessagingService,
    pub notifications: NotificationService,
    pub quota: QuotaLedger,
    pub reveals: RevealLedger,
}

impl Services {
    #[must_use]
    pub fn new(ctx: &ServiceContext) -> Self {
        let reveals = RevealLedger::new(ctx.clone());
        let quota = QuotaLedger::new(ctx.clone());

        Self {
            accounts: AccountService::new(ctx.clone()),
            profiles: ProfileService::new(ctx.clone(), reveals.clone()),
            following: FollowingService::new(ctx.clone()),
            blocking: BlockingService::new(ctx.clone()),
            content: ContentService::new(ctx.clone()),
            engagement: EngagementService::new(ctx.clone(), reveals.clone()),
            interests: InterestService::new(ctx.clone(), reveals.clone()),
            messaging: MessagingService::new(ctx.clone(), quota.clone(), reveals.clone()),
            notifications: NotificationService::new(ctx.store.clone()),
            quota,
            reveals,
        }
    }
}
