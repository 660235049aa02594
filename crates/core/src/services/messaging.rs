//! Messaging service for direct messages.
//!
//! The first message between two users opens their only conversation. An
//! investor cold-messaging a founder opens a request the founder must accept
//! before either side can continue; everything else opens active.

use pitchlane_common::{AppError, AppResult, Denial, DenialReason};
use pitchlane_db::{
    Account, Change,
    entities::{
        conversation::{self, ConversationStatus},
        message,
        notification::{NotificationPriority, NotificationType},
        user::AccountType,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::{Batch, MAX_PAGE, QuotaLedger, RevealLedger, ServiceContext};
use crate::policy::{
    Action, Actor, ConversationState, PartyView, Relationship, Side, Target, Transition,
    TransitionOutcome, conversation as lifecycle,
};

/// Input for sending a message.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SendMessageInput {
    #[validate(length(max = 2000))]
    pub content: Option<String>,

    #[validate(url)]
    pub attachment_url: Option<String>,
}

impl SendMessageInput {
    fn is_empty(&self) -> bool {
        self.content.as_deref().is_none_or(|c| c.trim().is_empty())
            && self.attachment_url.is_none()
    }
}

/// A delivered message and the conversation it landed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub conversation: conversation::Model,
    pub message: message::Model,
}

/// Conversation summary for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation: conversation::Model,
    /// Effective status, `blocked` whenever a block exists between the pair.
    pub status: ConversationStatus,
    pub partner: PartyView,
    pub unread_count: u64,
}

/// Messaging service.
#[derive(Clone)]
pub struct MessagingService {
    ctx: ServiceContext,
    quota: QuotaLedger,
    reveals: RevealLedger,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(ctx: ServiceContext, quota: QuotaLedger, reveals: RevealLedger) -> Self {
        Self {
            ctx,
            quota,
            reveals,
        }
    }

    /// Send a message to another user.
    pub async fn send(
        &self,
        sender_id: &str,
        recipient_id: &str,
        input: SendMessageInput,
    ) -> AppResult<SentMessage> {
        input.validate()?;
        if input.is_empty() {
            return Err(AppError::BadRequest(
                "A message needs text or an attachment".to_string(),
            ));
        }

        let actor = self.ctx.actor(sender_id).await?;
        let recipient = self.ctx.account(recipient_id).await?;

        match self.try_send(&actor, &recipient, &input).await {
            // Both users opened the conversation at once; the retry joins it.
            Err(AppError::Conflict(_)) => {
                tracing::debug!(sender_id = %sender_id, recipient_id = %recipient_id, "Retrying send after conflict");
                self.try_send(&actor, &recipient, &input).await
            }
            other => other,
        }
    }

    async fn try_send(
        &self,
        actor: &Actor,
        recipient: &Account,
        input: &SendMessageInput,
    ) -> AppResult<SentMessage> {
        let sender_id = actor.id();
        let recipient_id = recipient.id();
        let store = &self.ctx.store;

        let blocked = store.is_blocked_between(sender_id, recipient_id).await?;
        let existing = store
            .find_conversation_between(sender_id, recipient_id)
            .await?;
        let relationship = Relationship {
            blocked,
            follows_target: store.find_follow(sender_id, recipient_id).await?.is_some(),
            conversation: existing.as_ref().and_then(|c| {
                Side::of(c, sender_id)
                    .map(|side| (ConversationState::effective(c.status, blocked), side))
            }),
        };
        self.ctx.gate.can_act(
            actor,
            Action::Message,
            &Target::User {
                account: recipient,
                relationship,
            },
        )?;

        let reservation = self
            .quota
            .check_and_reserve(actor, recipient.account_type())
            .await?;

        let now = self.ctx.now();
        let mut batch = Batch::new();
        let mut conversation = match existing {
            Some(conversation) => conversation,
            None => {
                let accepted = store.has_accepted_interest(sender_id, recipient_id).await?;
                let revealed = store.is_revealed(sender_id, recipient_id).await?;
                let opening = lifecycle::open(&actor.account, recipient, accepted, revealed);
                let conversation = conversation::Model {
                    id: self.ctx.id_gen.generate_at(now),
                    participant1_id: sender_id.to_string(),
                    participant2_id: recipient_id.to_string(),
                    pair_key: conversation::Model::pair_key_for(sender_id, recipient_id),
                    status: opening.status,
                    is_revealed: opening.is_revealed,
                    last_message_at: None,
                    created_at: now,
                };
                batch.push(Change::CreateConversation(conversation.clone()));
                conversation
            }
        };
        if let Some(reservation) = reservation {
            batch.push(reservation);
        }

        let message = message::Model {
            id: self.ctx.id_gen.generate_at(now),
            conversation_id: conversation.id.clone(),
            sender_id: sender_id.to_string(),
            content: input.content.clone(),
            attachment_url: input.attachment_url.clone(),
            read_at: None,
            created_at: now,
        };
        batch.push(Change::InsertMessage(message.clone()));
        conversation.last_message_at = Some(now);

        let sender = self
            .reveals
            .view_of(&actor.account, Some(recipient_id), conversation.is_revealed)
            .await?;
        let (who, mut data) = match &sender {
            PartyView::Full(profile) => (
                format!("@{}", profile.username),
                json!({ "senderId": sender_id }),
            ),
            PartyView::Redacted(_) => ("A private investor".to_string(), json!({})),
        };
        data["conversationId"] = json!(conversation.id);
        data["messageId"] = json!(message.id);

        let draft = if conversation.status == ConversationStatus::Request {
            self.ctx.notifier.draft(
                recipient_id,
                NotificationType::MessageRequest,
                NotificationPriority::High,
                "New message request",
                format!("{who} wants to start a conversation"),
                data,
                now,
            )
        } else {
            self.ctx.notifier.draft(
                recipient_id,
                NotificationType::NewMessage,
                NotificationPriority::Normal,
                "New message",
                format!("{who} sent you a message"),
                data,
                now,
            )
        };
        batch.notify(draft);

        self.ctx.commit(batch).await?;

        tracing::debug!(
            conversation_id = %conversation.id,
            message_id = %message.id,
            status = ?conversation.status,
            "Message sent"
        );
        Ok(SentMessage {
            conversation,
            message,
        })
    }

    /// Accept a message request as its recipient.
    ///
    /// The conversation becomes active and revealed, an investor initiator is
    /// recorded as revealed to the accepting founder, and the initiator is
    /// notified.
    pub async fn accept(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> AppResult<conversation::Model> {
        let (conversation, side, state) = self.load(user_id, conversation_id).await?;
        let next = match state.apply(Transition::Accept, side)? {
            TransitionOutcome::Becomes(next) => next.status(),
            TransitionOutcome::Deleted => {
                return Err(AppError::Internal(
                    "accepting a request cannot delete it".to_string(),
                ));
            }
        };

        let initiator = self.ctx.account(&conversation.participant1_id).await?;
        let accepter = self.ctx.acting_account(user_id).await?;

        let now = self.ctx.now();
        let mut batch = Batch::new();
        batch.push(Change::TransitionConversation {
            id: conversation.id.clone(),
            from: conversation.status,
            to: next,
            is_revealed: Some(true),
        });
        if initiator.account_type() == AccountType::Investor
            && accepter.account_type() == AccountType::Founder
        {
            batch.push(self.reveals.record(initiator.id(), accepter.id()));
        }
        batch.notify(self.ctx.notifier.draft(
            initiator.id(),
            NotificationType::MessageRequestAccepted,
            NotificationPriority::Normal,
            "Message request accepted",
            format!("@{} accepted your message request", accepter.user.username),
            json!({ "conversationId": conversation.id, "userId": user_id }),
            now,
        ));

        match self.ctx.commit(batch).await {
            Ok(()) => {}
            Err(AppError::Conflict(_)) => {
                let (current, _, _) = self.load(user_id, conversation_id).await?;
                if current.status == next {
                    return Ok(current);
                }
                return Err(AppError::Conflict(
                    "This request was answered concurrently".to_string(),
                ));
            }
            Err(e) => return Err(e),
        }

        tracing::info!(conversation_id = %conversation.id, "Message request accepted");
        Ok(conversation::Model {
            status: next,
            is_revealed: true,
            ..conversation
        })
    }

    /// Decline a message request as its recipient.
    ///
    /// The conversation and its messages are deleted. The initiator is not
    /// told; they can try again later.
    pub async fn decline(&self, user_id: &str, conversation_id: &str) -> AppResult<()> {
        let (conversation, side, state) = self.load(user_id, conversation_id).await?;
        match state.apply(Transition::Decline, side)? {
            TransitionOutcome::Deleted => {}
            TransitionOutcome::Becomes(_) => {
                return Err(AppError::Internal(
                    "declining a request must delete it".to_string(),
                ));
            }
        }

        let result = self
            .ctx
            .store
            .commit(vec![Change::DeleteConversation {
                id: conversation.id.clone(),
                expected: conversation.status,
            }])
            .await;
        match result {
            Ok(()) => {
                tracing::debug!(conversation_id = %conversation.id, "Message request declined");
                Ok(())
            }
            Err(AppError::Conflict(e)) => {
                // Declined concurrently.
                let current = self.ctx.store.find_conversation(conversation_id).await?;
                if current.is_none() {
                    Ok(())
                } else {
                    Err(AppError::Conflict(e))
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Conversations of a user, most recent activity first.
    pub async fn list_conversations(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<ConversationSummary>> {
        let conversations = self
            .ctx
            .store
            .list_conversations(user_id, limit.min(MAX_PAGE))
            .await?;

        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let Some(partner_id) = conversation.partner_of(user_id) else {
                continue;
            };
            let partner = self.ctx.account(partner_id).await?;
            let blocked = self
                .ctx
                .store
                .is_blocked_between(user_id, partner_id)
                .await?;
            // The revealed flag speaks for the initiator only; the recipient
            // is disclosed through the ledger.
            let initiated_by_partner = partner_id == conversation.participant1_id;
            let partner_view = self
                .reveals
                .view_of(
                    &partner,
                    Some(user_id),
                    initiated_by_partner && conversation.is_revealed,
                )
                .await?;
            let unread_count = self
                .ctx
                .store
                .count_unread(&conversation.id, user_id)
                .await?;

            summaries.push(ConversationSummary {
                status: ConversationState::effective(conversation.status, blocked).status(),
                partner: partner_view,
                unread_count,
                conversation,
            });
        }
        Ok(summaries)
    }

    /// Read a page of messages, oldest first, marking the partner's messages read.
    pub async fn read(
        &self,
        user_id: &str,
        conversation_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<message::Model>> {
        let conversation = self.participant_conversation(user_id, conversation_id).await?;

        self.ctx
            .store
            .commit(vec![Change::MarkRead {
                conversation_id: conversation.id.clone(),
                reader_id: user_id.to_string(),
                at: self.ctx.now(),
            }])
            .await?;

        self.ctx
            .store
            .list_messages(&conversation.id, limit.min(MAX_PAGE), until_id)
            .await
    }

    /// Unread messages across all conversations of a user.
    pub async fn unread_count(&self, user_id: &str) -> AppResult<u64> {
        self.ctx.store.count_unread_total(user_id).await
    }

    async fn participant_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> AppResult<conversation::Model> {
        let conversation = self
            .ctx
            .store
            .find_conversation(conversation_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Conversation {conversation_id}")))?;
        if !conversation.has_participant(user_id) {
            return Err(Denial::new(
                DenialReason::NotParticipant,
                "You are not part of this conversation.",
            )
            .into());
        }
        Ok(conversation)
    }

    /// Conversation with the caller's side and its effective state.
    async fn load(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> AppResult<(conversation::Model, Side, ConversationState)> {
        let conversation = self.participant_conversation(user_id, conversation_id).await?;
        let side = Side::of(&conversation, user_id).ok_or_else(|| {
            AppError::Internal(format!("{user_id} has no side in {conversation_id}"))
        })?;
        let blocked = self
            .ctx
            .store
            .is_blocked_between(&conversation.participant1_id, &conversation.participant2_id)
            .await?;
        let state = ConversationState::effective(conversation.status, blocked);
        Ok((conversation, side, state))
    }
}
