//! Conversation lifecycle.
//!
//! ```text
//!   first message ──► REQUEST ──accept──► ACTIVE
//!         │              │
//!         │           decline
//!         │              ▼
//!         │          (deleted)
//!         └─────────────────────────────► ACTIVE
//!
//!   any state ──block between participants──► BLOCKED
//! ```
//!
//! BLOCKED is derived from block facts at read time, so a block created after
//! a conversation became active takes effect without touching the stored row.

use pitchlane_common::{Denial, DenialReason, Hint};
use pitchlane_db::{
    Account,
    entities::{conversation::{self, ConversationStatus}, user::AccountType},
};

/// Effective state of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationState {
    /// Opened by a first message, awaiting the recipient.
    Request,
    Active,
    /// A block exists between the participants, or the row was stored blocked.
    Blocked,
}

/// Recipient-driven transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Accept,
    Decline,
}

/// Result of applying a [`Transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Becomes(ConversationState),
    /// The conversation row is removed.
    Deleted,
}

/// Which end of the conversation a participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Sent the message that opened the conversation.
    Initiator,
    Recipient,
}

impl Side {
    /// Side of `user_id`, or `None` for non-participants.
    #[must_use]
    pub fn of(conversation: &conversation::Model, user_id: &str) -> Option<Self> {
        if conversation.participant1_id == user_id {
            Some(Self::Initiator)
        } else if conversation.participant2_id == user_id {
            Some(Self::Recipient)
        } else {
            None
        }
    }
}

/// Stored values for a conversation opened by a first message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opening {
    pub status: ConversationStatus,
    pub is_revealed: bool,
}

impl ConversationState {
    /// Combine the stored status with the current block relationship.
    #[must_use]
    pub const fn effective(stored: ConversationStatus, blocked_between: bool) -> Self {
        if blocked_between {
            return Self::Blocked;
        }
        match stored {
            ConversationStatus::Request => Self::Request,
            ConversationStatus::Active => Self::Active,
            ConversationStatus::Blocked => Self::Blocked,
        }
    }

    /// Stored status corresponding to this state.
    #[must_use]
    pub const fn status(self) -> ConversationStatus {
        match self {
            Self::Request => ConversationStatus::Request,
            Self::Active => ConversationStatus::Active,
            Self::Blocked => ConversationStatus::Blocked,
        }
    }

    /// Apply a transition requested by `side`.
    pub fn apply(self, transition: Transition, side: Side) -> Result<TransitionOutcome, Denial> {
        match (self, transition, side) {
            (Self::Request, Transition::Accept, Side::Recipient) => {
                Ok(TransitionOutcome::Becomes(Self::Active))
            }
            (Self::Request, Transition::Decline, Side::Recipient) => Ok(TransitionOutcome::Deleted),
            (Self::Request, _, Side::Initiator) => Err(Denial::new(
                DenialReason::InvalidTransition,
                "Only the recipient can answer a message request.",
            )),
            (Self::Active, Transition::Accept | Transition::Decline, _) => Err(Denial::new(
                DenialReason::InvalidTransition,
                "This conversation is not a pending request.",
            )),
            (Self::Blocked, Transition::Accept | Transition::Decline, _) => Err(Denial::new(
                DenialReason::ConversationBlocked,
                "This conversation is blocked.",
            )),
        }
    }

    /// Whether `side` may post a message into an existing conversation.
    pub fn check_send(self, side: Side) -> Result<(), Denial> {
        match (self, side) {
            (Self::Active, _) => Ok(()),
            (Self::Request, Side::Initiator) => Err(Denial::new(
                DenialReason::ConversationPending,
                "Your message request has not been accepted yet.",
            )
            .with_hint(Hint::WaitForAcceptance)),
            (Self::Request, Side::Recipient) => Err(Denial::new(
                DenialReason::ConversationPending,
                "Accept the message request before replying.",
            )),
            (Self::Blocked, _) => Err(Denial::new(
                DenialReason::ConversationBlocked,
                "This conversation is blocked.",
            )),
        }
    }
}

/// Initial state of a conversation opened by `sender` messaging `recipient`.
///
/// An investor cold-messaging a founder opens a request unless the founder
/// already accepted an interest from them. A non-public investor stays
/// hidden unless the founder already has them revealed.
#[must_use]
pub fn open(
    sender: &Account,
    recipient: &Account,
    has_accepted_interest: bool,
    already_revealed: bool,
) -> Opening {
    let is_investor = sender.account_type() == AccountType::Investor;
    let status = if is_investor
        && recipient.account_type() == AccountType::Founder
        && !has_accepted_interest
    {
        ConversationStatus::Request
    } else {
        ConversationStatus::Active
    };
    let is_revealed = !is_investor || sender.is_public_mode() || already_revealed;

    Opening {
        status,
        is_revealed,
    }
}
