//! End-to-end interaction scenarios over the in-memory store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use pitchlane_common::{AppError, AppResult, DenialReason, Hint, ManualTimeSource};
use pitchlane_core::{
    CommentInput, NotificationEmitter, PolicySettings, RealtimeEvent, RealtimeHub,
    RegisterAccountInput, SendMessageInput, ServiceContext, Services, UpdateInvestorProfileInput,
};
use pitchlane_db::{
    Change, MemoryStore, Store,
    entities::{
        conversation::ConversationStatus,
        user::{self, AccountType},
        video::{self, VideoKind, VisibilityClass},
    },
};

struct World {
    store: Arc<MemoryStore>,
    clock: Arc<ManualTimeSource>,
    hub: Arc<RealtimeHub>,
    services: Services,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
}

impl World {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualTimeSource::new(start()));
        let hub = Arc::new(RealtimeHub::default());
        let ctx = ServiceContext::new(
            store.clone(),
            Arc::new(PolicySettings::default()),
            clock.clone(),
        )
        .with_emitter(hub.clone());

        Self {
            store,
            clock,
            hub,
            services: Services::new(&ctx),
        }
    }

    async fn register(&self, username: &str, account_type: AccountType) -> String {
        self.services
            .accounts
            .register(RegisterAccountInput {
                username: username.to_string(),
                name: None,
                account_type,
            })
            .await
            .unwrap()
            .user
            .id
    }

    /// Register an investor and walk them through approval.
    async fn approved_investor(&self, username: &str, public: bool) -> String {
        let id = self.register(username, AccountType::Investor).await;
        if public {
            self.services
                .accounts
                .update_investor_profile(
                    &id,
                    UpdateInvestorProfileInput {
                        is_public_mode: Some(true),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }
        self.services.accounts.submit_verification(&id).await.unwrap();
        let moderator = self.moderator().await;
        self.services
            .accounts
            .review_verification(&moderator, &id, true, None)
            .await
            .unwrap();
        id
    }

    async fn moderator(&self) -> String {
        if let Some(existing) = self.store.find_user_by_username("mod").await.unwrap() {
            return existing.id;
        }
        let model = user::Model {
            id: "moderator".to_string(),
            username: "mod".to_string(),
            name: None,
            account_type: AccountType::Lurker,
            is_active: true,
            is_moderator: true,
            created_at: start(),
            updated_at: None,
        };
        self.store
            .commit(vec![Change::InsertUser(model.clone())])
            .await
            .unwrap();
        model.id
    }

    async fn publish(&self, owner: &str, id: &str, visibility: VisibilityClass) {
        self.store
            .commit(vec![Change::InsertVideo(video::Model {
                id: id.to_string(),
                user_id: owner.to_string(),
                title: "Demo day".to_string(),
                description: None,
                kind: VideoKind::Pitch,
                visibility,
                duration_secs: 120,
                url: format!("https://cdn.example.com/{id}.mp4"),
                created_at: start(),
            })])
            .await
            .unwrap();
    }
}

fn text(content: &str) -> SendMessageInput {
    SendMessageInput {
        content: Some(content.to_string()),
        attachment_url: None,
    }
}

fn denial(err: AppError) -> pitchlane_common::Denial {
    match err {
        AppError::Forbidden(denial) => denial,
        other => panic!("expected a denial, got {other:?}"),
    }
}

#[tokio::test]
async fn lurker_cannot_like() {
    let world = World::new();
    let founder = world.register("founder", AccountType::Founder).await;
    let lurker = world.register("lurker", AccountType::Lurker).await;
    world.publish(&founder, "v1", VisibilityClass::Public).await;

    let denial = denial(world.services.engagement.like(&lurker, "v1").await.unwrap_err());
    assert_eq!(denial.reason, DenialReason::AccountType);
    assert_eq!(denial.message, "Lurkers cannot like videos.");
    assert_eq!(denial.hint, Some(Hint::Upgrade));
}

#[tokio::test]
async fn investor_must_be_verified_to_comment() {
    let world = World::new();
    let founder = world.register("founder", AccountType::Founder).await;
    let investor = world.register("investor", AccountType::Investor).await;
    world.publish(&founder, "v1", VisibilityClass::Public).await;

    let comment = || CommentInput {
        text: "What is your CAC?".to_string(),
    };
    let denial = denial(
        world
            .services
            .engagement
            .comment(&investor, "v1", comment())
            .await
            .unwrap_err(),
    );
    assert_eq!(denial.reason, DenialReason::VerificationRequired);
    assert_eq!(denial.message, "Verify your profile to comment.");
    assert_eq!(denial.hint, Some(Hint::Verify));

    world.services.accounts.submit_verification(&investor).await.unwrap();
    let moderator = world.moderator().await;
    world
        .services
        .accounts
        .review_verification(&moderator, &investor, true, None)
        .await
        .unwrap();

    world
        .services
        .engagement
        .comment(&investor, "v1", comment())
        .await
        .unwrap();
}

#[tokio::test]
async fn private_investor_request_becomes_revealed_conversation() {
    let world = World::new();
    let founder = world.register("founder", AccountType::Founder).await;
    let investor = world.approved_investor("investor", false).await;

    let sent = world
        .services
        .messaging
        .send(&investor, &founder, text("Saw your pitch"))
        .await
        .unwrap();
    assert_eq!(sent.conversation.status, ConversationStatus::Request);
    assert!(!sent.conversation.is_revealed);

    let card = world
        .services
        .profiles
        .view(Some(&founder), &investor)
        .await
        .unwrap();
    assert!(card.profile.is_redacted());

    let accepted = world
        .services
        .messaging
        .accept(&founder, &sent.conversation.id)
        .await
        .unwrap();
    assert_eq!(accepted.status, ConversationStatus::Active);
    assert!(accepted.is_revealed);
    assert!(world.store.is_revealed(&investor, &founder).await.unwrap());

    let card = world
        .services
        .profiles
        .view(Some(&founder), &investor)
        .await
        .unwrap();
    assert!(!card.profile.is_redacted());
}

#[tokio::test]
async fn free_founder_monthly_quota_rolls_over() {
    let world = World::new();
    let founder = world.register("founder", AccountType::Founder).await;
    let mut investors = Vec::new();
    for i in 0..4 {
        investors.push(world.approved_investor(&format!("investor{i}"), true).await);
    }

    for investor in &investors[..3] {
        world
            .services
            .messaging
            .send(&founder, investor, text("Raising our seed"))
            .await
            .unwrap();
    }

    let err = world
        .services
        .messaging
        .send(&founder, &investors[3], text("Raising our seed"))
        .await
        .unwrap_err();
    let AppError::QuotaExceeded { resets_at, .. } = err else {
        panic!("expected quota exhaustion");
    };
    assert_eq!(resets_at, Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap());
    assert!(world
        .store
        .find_conversation_between(&founder, &investors[3])
        .await
        .unwrap()
        .is_none());

    world.clock.set(resets_at + Duration::hours(1));
    world
        .services
        .messaging
        .send(&founder, &investors[3], text("Raising our seed"))
        .await
        .unwrap();
    let usage = world.services.quota.usage(&founder).await.unwrap().unwrap();
    assert_eq!(usage.used, 1);
    assert_eq!(usage.resets_at, Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap());
}

#[tokio::test]
async fn concurrent_sends_never_exceed_quota() {
    let world = World::new();
    let founder = world.register("founder", AccountType::Founder).await;
    let mut investors = Vec::new();
    for i in 0..6 {
        investors.push(world.approved_investor(&format!("investor{i}"), true).await);
    }

    let sends = investors
        .iter()
        .map(|investor| world.services.messaging.send(&founder, investor, text("Hi")));
    let results = futures::future::join_all(sends).await;

    let delivered = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(delivered, 3);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, AppError::QuotaExceeded { .. })));
}

#[tokio::test]
async fn block_is_symmetric_and_drops_follows() {
    let world = World::new();
    let founder = world.register("founder", AccountType::Founder).await;
    let builder = world.register("builder", AccountType::Builder).await;
    world.services.following.follow(&founder, &builder).await.unwrap();
    world.services.following.follow(&builder, &founder).await.unwrap();

    world.services.blocking.block(&founder, &builder).await.unwrap();

    for (from, to) in [(&founder, &builder), (&builder, &founder)] {
        let denial = denial(
            world
                .services
                .messaging
                .send(from, to, text("hello"))
                .await
                .unwrap_err(),
        );
        assert_eq!(denial.reason, DenialReason::Blocked);
        assert!(!world.services.following.is_following(from, to).await.unwrap());
    }
}

#[tokio::test]
async fn simultaneous_first_messages_share_one_conversation() {
    let world = World::new();
    let founder = world.register("founder", AccountType::Founder).await;
    let builder = world.register("builder", AccountType::Builder).await;

    let (a, b) = tokio::join!(
        world.services.messaging.send(&founder, &builder, text("ping")),
        world.services.messaging.send(&builder, &founder, text("pong")),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.conversation.id, b.conversation.id);

    let listed = world
        .services
        .messaging
        .list_conversations(&founder, 10)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn declined_request_is_silent() {
    let world = World::new();
    let founder = world.register("founder", AccountType::Founder).await;
    let investor = world.approved_investor("investor", false).await;

    let sent = world
        .services
        .messaging
        .send(&investor, &founder, text("Coffee?"))
        .await
        .unwrap();
    let mut investor_rx = world.hub.subscribe(&investor).await;

    world
        .services
        .messaging
        .decline(&founder, &sent.conversation.id)
        .await
        .unwrap();

    assert!(investor_rx.try_recv().is_err());
    assert!(world
        .store
        .find_conversation(&sent.conversation.id)
        .await
        .unwrap()
        .is_none());
    assert!(!world.store.is_revealed(&investor, &founder).await.unwrap());

    // The investor may try again later with a fresh request.
    let again = world
        .services
        .messaging
        .send(&investor, &founder, text("Coffee next week?"))
        .await
        .unwrap();
    assert_eq!(again.conversation.status, ConversationStatus::Request);
}

#[tokio::test]
async fn accepted_interest_lets_investor_message_directly() {
    let world = World::new();
    let founder = world.register("founder", AccountType::Founder).await;
    let investor = world.approved_investor("investor", false).await;
    world.publish(&founder, "v1", VisibilityClass::InvestorsOnly).await;

    let interest = world
        .services
        .interests
        .express(&investor, "v1", Default::default())
        .await
        .unwrap();
    world
        .services
        .interests
        .accept(&founder, &interest.id)
        .await
        .unwrap();

    let sent = world
        .services
        .messaging
        .send(&investor, &founder, text("Thanks for accepting"))
        .await
        .unwrap();
    assert_eq!(sent.conversation.status, ConversationStatus::Active);
    assert!(sent.conversation.is_revealed);
}

struct FailingEmitter;

#[async_trait]
impl NotificationEmitter for FailingEmitter {
    async fn emit(&self, _user_id: &str, _event: RealtimeEvent) -> AppResult<()> {
        Err(AppError::Internal("socket closed".to_string()))
    }
}

#[tokio::test]
async fn emitter_failure_does_not_fail_the_action() {
    let store = Arc::new(MemoryStore::new());
    let ctx = ServiceContext::new(
        store.clone(),
        Arc::new(PolicySettings::default()),
        Arc::new(ManualTimeSource::new(start())),
    )
    .with_emitter(Arc::new(FailingEmitter));
    let services = Services::new(&ctx);

    let founder = services
        .accounts
        .register(RegisterAccountInput {
            username: "founder".to_string(),
            name: None,
            account_type: AccountType::Founder,
        })
        .await
        .unwrap();
    let builder = services
        .accounts
        .register(RegisterAccountInput {
            username: "builder".to_string(),
            name: None,
            account_type: AccountType::Builder,
        })
        .await
        .unwrap();

    services
        .following
        .follow(builder.id(), founder.id())
        .await
        .unwrap();

    let stored = store.list_notifications(founder.id(), 10, None).await.unwrap();
    assert_eq!(stored.len(), 1);
}
