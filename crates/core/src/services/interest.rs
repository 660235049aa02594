//! Investor interest in founders' videos.
//!
//! Accepting an interest reveals the investor to the founder and opens (or
//! activates) their conversation in one commit. Declining is silent.

use pitchlane_common::{AppError, AppResult, Denial, DenialReason};
use pitchlane_db::{
    Change,
    entities::{
        conversation::{self, ConversationStatus},
        express_interest::{self, InterestStatus},
        notification::{NotificationPriority, NotificationType},
        user::AccountType,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::{Batch, MAX_PAGE, RevealLedger, ServiceContext};
use crate::policy::{Action, PartyView, Target};

/// Input for expressing interest.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ExpressInterestInput {
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

/// An interest with the investor as the founder may see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestView {
    pub interest: express_interest::Model,
    pub investor: PartyView,
}

#[derive(Clone)]
pub struct InterestService {
    ctx: ServiceContext,
    reveals: RevealLedger,
}

fn blocked(message: &str) -> AppError {
    AppError::Forbidden(Denial::new(DenialReason::Blocked, message))
}

impl InterestService {
    #[must_use]
    pub const fn new(ctx: ServiceContext, reveals: RevealLedger) -> Self {
        Self { ctx, reveals }
    }

    /// Express interest in a founder's video.
    ///
    /// Repeating it for the same video returns the existing interest.
    pub async fn express(
        &self,
        investor_id: &str,
        video_id: &str,
        input: ExpressInterestInput,
    ) -> AppResult<express_interest::Model> {
        input.validate()?;
        let actor = self.ctx.actor(investor_id).await?;
        let video = self.ctx.video(video_id).await?;
        self.ctx
            .gate
            .can_act(&actor, Action::ExpressInterest, &Target::Video(&video))?;

        let founder = self.ctx.account(&video.user_id).await?;
        if founder.account_type() != AccountType::Founder {
            return Err(Denial::new(
                DenialReason::Unsupported,
                "Interest can only be expressed in a founder's video.",
            )
            .into());
        }
        if self
            .ctx
            .store
            .is_blocked_between(investor_id, founder.id())
            .await?
        {
            return Err(blocked("You cannot express interest to this user."));
        }

        if let Some(existing) = self.find(investor_id, founder.id(), video_id).await? {
            return Ok(existing);
        }

        let now = self.ctx.now();
        let model = express_interest::Model {
            id: self.ctx.id_gen.generate_at(now),
            investor_id: investor_id.to_string(),
            founder_id: founder.id().to_string(),
            video_id: video_id.to_string(),
            status: InterestStatus::Pending,
            note: input.note,
            created_at: now,
            updated_at: None,
        };

        let investor = self
            .reveals
            .view_of(&actor.account, Some(founder.id()), false)
            .await?;
        let (body, data) = match &investor {
            PartyView::Full(profile) => (
                format!(
                    "@{} is interested in \"{}\"",
                    profile.username, video.title
                ),
                json!({ "interestId": model.id, "videoId": video_id, "investorId": investor_id }),
            ),
            PartyView::Redacted(_) => (
                format!("A private investor is interested in \"{}\"", video.title),
                json!({ "interestId": model.id, "videoId": video_id }),
            ),
        };

        let mut batch = Batch::new();
        batch.push(Change::InsertInterest(model.clone()));
        batch.notify(self.ctx.notifier.draft(
            founder.id(),
            NotificationType::InterestReceived,
            NotificationPriority::High,
            "New investor interest",
            body,
            data,
            now,
        ));

        match self.ctx.commit(batch).await {
            Ok(()) => {
                tracing::info!(interest_id = %model.id, video_id = %video_id, "Interest expressed");
                Ok(model)
            }
            Err(AppError::Conflict(_)) => self
                .find(investor_id, founder.id(), video_id)
                .await?
                .ok_or_else(|| AppError::Internal("interest vanished after conflict".to_string())),
            Err(e) => Err(e),
        }
    }

    /// Accept an interest as the founder.
    ///
    /// Reveals the investor, opens an active revealed conversation (or
    /// activates an existing request) and notifies the investor. Accepting
    /// twice is a no-op.
    pub async fn accept(
        &self,
        founder_id: &str,
        interest_id: &str,
    ) -> AppResult<express_interest::Model> {
        let interest = self.owned(founder_id, interest_id).await?;
        match interest.status {
            InterestStatus::Accepted => return Ok(interest),
            InterestStatus::Declined => {
                return Err(AppError::BadRequest(
                    "This interest was already declined".to_string(),
                ));
            }
            InterestStatus::Pending => {}
        }

        match self.try_accept(founder_id, &interest).await {
            // The pair's conversation appeared after we looked; look again.
            Err(AppError::Conflict(_)) => {
                let current = self.owned(founder_id, interest_id).await?;
                match current.status {
                    InterestStatus::Accepted => return Ok(current),
                    InterestStatus::Declined => {
                        return Err(AppError::BadRequest(
                            "This interest was already declined".to_string(),
                        ));
                    }
                    InterestStatus::Pending => {}
                }
                tracing::debug!(interest_id = %interest_id, "Retrying accept after conflict");
                self.try_accept(founder_id, &current).await
            }
            other => other,
        }
    }

    async fn try_accept(
        &self,
        founder_id: &str,
        interest: &express_interest::Model,
    ) -> AppResult<express_interest::Model> {
        let investor_id = interest.investor_id.as_str();
        if self
            .ctx
            .store
            .is_blocked_between(founder_id, investor_id)
            .await?
        {
            return Err(blocked("You cannot accept interest from this user."));
        }

        let now = self.ctx.now();
        let mut batch = Batch::new();
        batch.push(Change::SetInterestStatus {
            id: interest.id.clone(),
            from: InterestStatus::Pending,
            to: InterestStatus::Accepted,
            at: now,
        });
        batch.push(self.reveals.record(investor_id, founder_id));

        let existing = self
            .ctx
            .store
            .find_conversation_between(founder_id, investor_id)
            .await?;
        let conversation_id = match existing {
            None => {
                let id = self.ctx.id_gen.generate_at(now);
                batch.push(Change::CreateConversation(conversation::Model {
                    id: id.clone(),
                    participant1_id: founder_id.to_string(),
                    participant2_id: investor_id.to_string(),
                    pair_key: conversation::Model::pair_key_for(founder_id, investor_id),
                    status: ConversationStatus::Active,
                    is_revealed: true,
                    last_message_at: None,
                    created_at: now,
                }));
                id
            }
            Some(existing) if existing.status == ConversationStatus::Blocked => {
                return Err(Denial::new(
                    DenialReason::ConversationBlocked,
                    "This conversation is blocked.",
                )
                .into());
            }
            Some(existing) => {
                batch.push(Change::TransitionConversation {
                    id: existing.id.clone(),
                    from: existing.status,
                    to: ConversationStatus::Active,
                    is_revealed: Some(true),
                });
                existing.id
            }
        };

        batch.notify(self.ctx.notifier.draft(
            investor_id,
            NotificationType::InterestAccepted,
            NotificationPriority::High,
            "Interest accepted",
            "A founder accepted your interest. You can now message them.",
            json!({
                "interestId": interest.id,
                "conversationId": conversation_id,
                "founderId": founder_id,
            }),
            now,
        ));
        self.ctx.commit(batch).await?;

        tracing::info!(
            interest_id = %interest.id,
            conversation_id = %conversation_id,
            "Interest accepted"
        );
        Ok(express_interest::Model {
            status: InterestStatus::Accepted,
            updated_at: Some(now),
            ..interest.clone()
        })
    }

    /// Decline an interest as the founder. The investor is not notified.
    pub async fn decline(&self, founder_id: &str, interest_id: &str) -> AppResult<()> {
        let interest = self.owned(founder_id, interest_id).await?;
        match interest.status {
            InterestStatus::Declined => return Ok(()),
            InterestStatus::Accepted => {
                return Err(AppError::BadRequest(
                    "This interest was already accepted".to_string(),
                ));
            }
            InterestStatus::Pending => {}
        }

        let result = self
            .ctx
            .store
            .commit(vec![Change::SetInterestStatus {
                id: interest.id,
                from: InterestStatus::Pending,
                to: InterestStatus::Declined,
                at: self.ctx.now(),
            }])
            .await;
        match result {
            Err(AppError::Conflict(_)) => {
                let current = self.owned(founder_id, interest_id).await?;
                if current.status == InterestStatus::Declined {
                    Ok(())
                } else {
                    Err(AppError::Conflict(
                        "This interest was answered concurrently".to_string(),
                    ))
                }
            }
            other => other,
        }
    }

    /// Interests received by a founder, newest first.
    ///
    /// Investors of accepted interests are shown in full.
    pub async fn list_for_founder(
        &self,
        founder_id: &str,
        limit: u64,
    ) -> AppResult<Vec<InterestView>> {
        let interests = self
            .ctx
            .store
            .list_interests_for_founder(founder_id, limit.min(MAX_PAGE))
            .await?;

        let mut views = Vec::with_capacity(interests.len());
        for interest in interests {
            let investor = self.ctx.account(&interest.investor_id).await?;
            let accepted = interest.status == InterestStatus::Accepted;
            let investor = self
                .reveals
                .view_of(&investor, Some(founder_id), accepted)
                .await?;
            views.push(InterestView { interest, investor });
        }
        Ok(views)
    }

    /// Interests an investor expressed, newest first.
    pub async fn list_for_investor(
        &self,
        investor_id: &str,
        limit: u64,
    ) -> AppResult<Vec<express_interest::Model>> {
        self.ctx
            .store
            .list_interests_for_investor(investor_id, limit.min(MAX_PAGE))
            .await
    }

    async fn find(
        &self,
        investor_id: &str,
        founder_id: &str,
        video_id: &str,
    ) -> AppResult<Option<express_interest::Model>> {
        self.ctx
            .store
            .find_interest_by_triple(investor_id, founder_id, video_id)
            .await
    }

    /// Load an interest addressed to `founder_id`.
    async fn owned(
        &self,
        founder_id: &str,
        interest_id: &str,
    ) -> AppResult<express_interest::Model> {
        let interest = self
            .ctx
            .store
            .find_interest(interest_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Interest {interest_id}")))?;
        if interest.founder_id != founder_id {
            return Err(Denial::new(
                DenialReason::NotOwner,
                "Only the founder can answer this interest.",
            )
            .into());
        }
        Ok(interest)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::realtime::RealtimeEvent;
    use crate::test_support::{Harness, account, investor, t0, video};
    use pitchlane_db::{
        Store,
        entities::{investor_verification::VerificationStatus, video::VisibilityClass},
    };

    async fn setup() -> Harness {
        let h = Harness::new();
        h.seed(&account("fdr", AccountType::Founder)).await;
        h.seed(&account("bld", AccountType::Builder)).await;
        h.seed(&investor("inv", VerificationStatus::Approved, false)).await;
        h.seed_video(&video("v1", "fdr", VisibilityClass::Public)).await;
        h.seed_video(&video("v2", "bld", VisibilityClass::Public)).await;
        h
    }

    fn reason(err: AppError) -> DenialReason {
        match err {
            AppError::Forbidden(denial) => denial.reason,
            other => panic!("expected a denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_express_is_idempotent_and_redacted() {
        let h = setup().await;
        let mut rx = h.hub.subscribe("fdr").await;

        let first = h
            .services
            .interests
            .express("inv", "v1", ExpressInterestInput::default())
            .await
            .unwrap();
        let second = h
            .services
            .interests
            .express("inv", "v1", ExpressInterestInput::default())
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let RealtimeEvent::Notification { body, data, .. } = rx.try_recv().unwrap();
        assert!(body.starts_with("A private investor"));
        assert!(data.get("investorId").is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_only_investors_on_founder_videos() {
        let h = setup().await;

        let err = h
            .services
            .interests
            .express("bld", "v1", ExpressInterestInput::default())
            .await
            .unwrap_err();
        assert_eq!(reason(err), DenialReason::AccountType);

        let err = h
            .services
            .interests
            .express("inv", "v2", ExpressInterestInput::default())
            .await
            .unwrap_err();
        assert_eq!(reason(err), DenialReason::Unsupported);
    }

    #[tokio::test]
    async fn test_accept_reveals_and_opens_conversation() {
        let h = setup().await;
        let interest = h
            .services
            .interests
            .express("inv", "v1", ExpressInterestInput::default())
            .await
            .unwrap();
        let mut rx = h.hub.subscribe("inv").await;

        let accepted = h.services.interests.accept("fdr", &interest.id).await.unwrap();
        assert_eq!(accepted.status, InterestStatus::Accepted);
        assert!(h.services.reveals.is_revealed_to("inv", "fdr").await.unwrap());

        let conversation = h
            .store
            .find_conversation_between("inv", "fdr")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conversation.status, ConversationStatus::Active);
        assert!(conversation.is_revealed);
        assert_eq!(conversation.participant1_id, "fdr");

        let RealtimeEvent::Notification {
            notification_type, ..
        } = rx.try_recv().unwrap();
        assert_eq!(notification_type, NotificationType::InterestAccepted);

        // A second accept changes nothing and sends nothing.
        h.services.interests.accept("fdr", &interest.id).await.unwrap();
        assert!(rx.try_recv().is_err());

        let views = h.services.interests.list_for_founder("fdr", 10).await.unwrap();
        assert_eq!(views.len(), 1);
        assert!(!views[0].investor.is_redacted());
    }

    #[tokio::test]
    async fn test_accept_activates_pending_request() {
        let h = setup().await;
        h.services
            .messaging
            .send(
                "inv",
                "fdr",
                crate::services::SendMessageInput {
                    content: Some("Hello".to_string()),
                    attachment_url: None,
                },
            )
            .await
            .unwrap();
        let interest = h
            .services
            .interests
            .express("inv", "v1", ExpressInterestInput::default())
            .await
            .unwrap();

        h.services.interests.accept("fdr", &interest.id).await.unwrap();

        let conversation = h
            .store
            .find_conversation_between("fdr", "inv")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conversation.status, ConversationStatus::Active);
        assert!(conversation.is_revealed);
        assert_eq!(conversation.participant1_id, "inv");
    }

    #[tokio::test]
    async fn test_accept_joins_request_opened_concurrently() {
        let (h, store) = Harness::interleaved();
        h.seed(&account("fdr", AccountType::Founder)).await;
        h.seed(&investor("inv", VerificationStatus::Approved, false)).await;
        h.seed_video(&video("v1", "fdr", VisibilityClass::Public)).await;
        let interest = h
            .services
            .interests
            .express("inv", "v1", ExpressInterestInput::default())
            .await
            .unwrap();

        // The investor's first message lands after the founder looked for a
        // conversation but before the acceptance is written.
        store
            .interleave(vec![Change::CreateConversation(conversation::Model {
                id: "c-request".to_string(),
                participant1_id: "inv".to_string(),
                participant2_id: "fdr".to_string(),
                pair_key: conversation::Model::pair_key_for("inv", "fdr"),
                status: ConversationStatus::Request,
                is_revealed: false,
                last_message_at: None,
                created_at: t0(),
            })])
            .await;

        let accepted = h.services.interests.accept("fdr", &interest.id).await.unwrap();
        assert_eq!(accepted.status, InterestStatus::Accepted);

        let conversation = h
            .store
            .find_conversation_between("fdr", "inv")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conversation.id, "c-request");
        assert_eq!(conversation.status, ConversationStatus::Active);
        assert!(conversation.is_revealed);
        assert!(h.services.reveals.is_revealed_to("inv", "fdr").await.unwrap());
    }

    #[tokio::test]
    async fn test_decline_is_silent() {
        let h = setup().await;
        let interest = h
            .services
            .interests
            .express("inv", "v1", ExpressInterestInput::default())
            .await
            .unwrap();
        let mut rx = h.hub.subscribe("inv").await;

        h.services.interests.decline("fdr", &interest.id).await.unwrap();
        h.services.interests.decline("fdr", &interest.id).await.unwrap();

        assert!(rx.try_recv().is_err());
        assert!(h
            .store
            .list_notifications("inv", 10, None)
            .await
            .unwrap()
            .is_empty());
        assert!(!h.services.reveals.is_revealed_to("inv", "fdr").await.unwrap());

        let err = h.services.interests.accept("fdr", &interest.id).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let views = h.services.interests.list_for_founder("fdr", 10).await.unwrap();
        assert!(views[0].investor.is_redacted());
    }

    #[tokio::test]
    async fn test_only_addressed_founder_answers() {
        let h = setup().await;
        let interest = h
            .services
            .interests
            .express("inv", "v1", ExpressInterestInput::default())
            .await
            .unwrap();

        let err = h.services.interests.accept("bld", &interest.id).await.unwrap_err();
        assert_eq!(reason(err), DenialReason::NotOwner);
    }

    #[tokio::test]
    async fn test_accept_denied_after_block() {
        let h = setup().await;
        let interest = h
            .services
            .interests
            .express("inv", "v1", ExpressInterestInput::default())
            .await
            .unwrap();
        h.services.blocking.block("inv", "fdr").await.unwrap();

        let err = h.services.interests.accept("fdr", &interest.id).await.unwrap_err();
        assert_eq!(reason(err), DenialReason::Blocked);
        assert!(!h.services.reveals.is_revealed_to("inv", "fdr").await.unwrap());
    }
}
