//! Permission gate.
//!
//! [`PermissionGate::can_act`] composes small predicates in a fixed order:
//! account state, block relationship, account-type allow-list, investor
//! verification, then the action-specific rules (visibility, tier gates,
//! posting caps, conversation state, recipient privacy).

use std::sync::Arc;

use pitchlane_common::{Denial, DenialReason, Hint};
use pitchlane_db::{
    Account,
    entities::{
        user::AccountType,
        video::{self, VideoKind, VisibilityClass},
    },
};

use super::{
    Actor,
    conversation::{ConversationState, Side},
    visibility::check_video_visibility,
};
use crate::settings::PolicySettings;

/// Something an actor wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Like,
    Comment,
    ExpressInterest,
    Upload,
    ViewAnalytics,
    Follow,
    Message,
}

impl Action {
    /// Wording used in denial messages.
    const fn phrase(self) -> &'static str {
        match self {
            Self::View => "watch videos",
            Self::Like => "like videos",
            Self::Comment => "comment",
            Self::ExpressInterest => "express interest",
            Self::Upload => "upload videos",
            Self::ViewAnalytics => "view analytics",
            Self::Follow => "follow people",
            Self::Message => "send messages",
        }
    }

    /// Actions an investor may only take once approved.
    const fn requires_verification(self) -> bool {
        matches!(
            self,
            Self::Like | Self::Comment | Self::ExpressInterest | Self::Message
        )
    }
}

/// A video about to be uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoDraft {
    pub kind: VideoKind,
    pub visibility: VisibilityClass,
    /// Videos the uploader already posted since local midnight.
    pub posts_today: u64,
}

/// Facts about the actor and a target user, loaded by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Relationship {
    /// A block exists in either direction.
    pub blocked: bool,
    /// The actor follows the target.
    pub follows_target: bool,
    /// Existing conversation between the two, with the actor's side.
    pub conversation: Option<(ConversationState, Side)>,
}

/// What an action is aimed at.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Video(&'a video::Model),
    Draft(&'a VideoDraft),
    User {
        account: &'a Account,
        relationship: Relationship,
    },
}

/// Decides whether an actor may perform an action on a target.
#[derive(Debug, Clone)]
pub struct PermissionGate {
    settings: Arc<PolicySettings>,
}

impl PermissionGate {
    #[must_use]
    pub const fn new(settings: Arc<PolicySettings>) -> Self {
        Self { settings }
    }

    /// Allow or deny `action` by `actor` on `target`.
    pub fn can_act(
        &self,
        actor: &Actor,
        action: Action,
        target: &Target<'_>,
    ) -> Result<(), Denial> {
        if !actor.account.user.is_active {
            return Err(Denial::new(
                DenialReason::Inactive,
                "This account is deactivated.",
            ));
        }

        // Blocks veto before any other rule.
        if let Target::User { relationship, .. } = target
            && relationship.blocked
        {
            match action {
                Action::Message => {
                    return Err(Denial::new(
                        DenialReason::Blocked,
                        "You cannot message this user.",
                    ));
                }
                Action::Follow => {
                    return Err(Denial::new(
                        DenialReason::Blocked,
                        "You cannot follow this user.",
                    ));
                }
                _ => {}
            }
        }

        check_account_type(&actor.account, action)?;

        if action.requires_verification() && !verified(&actor.account) {
            return Err(Denial::new(
                DenialReason::VerificationRequired,
                format!("Verify your profile to {}.", action.phrase()),
            )
            .with_hint(Hint::Verify));
        }

        match (action, target) {
            (Action::View | Action::Like | Action::Comment, Target::Video(video)) => {
                check_video_visibility(Some(&actor.account), video)
            }
            (Action::ExpressInterest, Target::Video(video)) => {
                if video.user_id == actor.id() {
                    return Err(Denial::new(
                        DenialReason::Unsupported,
                        "You cannot express interest in your own video.",
                    ));
                }
                check_video_visibility(Some(&actor.account), video)
            }
            (Action::ViewAnalytics, Target::Video(video)) => check_analytics(actor, video),
            (Action::Upload, Target::Draft(draft)) => self.check_upload(actor, draft),
            (Action::Follow, Target::User { account, .. }) => {
                if account.id() == actor.id() {
                    return Err(Denial::new(
                        DenialReason::Unsupported,
                        "You cannot follow yourself.",
                    ));
                }
                Ok(())
            }
            (
                Action::Message,
                Target::User {
                    account,
                    relationship,
                },
            ) => check_message(actor, account, relationship),
            (action, _) => Err(Denial::new(
                DenialReason::Unsupported,
                format!("Cannot {} on this target.", action.phrase()),
            )),
        }
    }

    fn check_upload(&self, actor: &Actor, draft: &VideoDraft) -> Result<(), Denial> {
        let account_type = actor.account.account_type();
        if !self.settings.may_upload(draft.kind, account_type) {
            return Err(Denial::new(
                DenialReason::ContentTypeRestricted,
                format!(
                    "{} accounts cannot upload {} videos.",
                    account_label(account_type),
                    kind_label(draft.kind)
                ),
            ));
        }

        if self.settings.premium_visibility.contains(&draft.visibility) && !actor.premium {
            return Err(Denial::new(
                DenialReason::PremiumRequired,
                "Upgrade to a premium plan to publish to this audience.",
            )
            .with_hint(Hint::Upgrade));
        }

        let cap = self.settings.daily_post_cap(actor.premium);
        if draft.posts_today >= u64::from(cap) {
            let denial = Denial::new(
                DenialReason::DailyPostLimit,
                format!("Daily limit of {cap} videos reached."),
            );
            return Err(if actor.premium {
                denial
            } else {
                denial.with_hint(Hint::Upgrade)
            });
        }

        Ok(())
    }
}

fn check_analytics(actor: &Actor, video: &video::Model) -> Result<(), Denial> {
    if video.user_id != actor.id() {
        return Err(Denial::new(
            DenialReason::NotOwner,
            "Only the uploader can view analytics for this video.",
        ));
    }
    if !actor.premium {
        return Err(Denial::new(
            DenialReason::PremiumRequired,
            "Upgrade to a premium plan to view analytics.",
        )
        .with_hint(Hint::Upgrade));
    }
    Ok(())
}

fn verified(account: &Account) -> bool {
    account.account_type() != AccountType::Investor || account.is_approved_investor()
}

fn check_account_type(account: &Account, action: Action) -> Result<(), Denial> {
    match (account.account_type(), action) {
        (AccountType::Lurker, Action::Like) => Err(lurker_denial("Lurkers cannot like videos.")),
        (AccountType::Lurker, Action::Comment) => {
            Err(lurker_denial("Lurkers cannot comment on videos."))
        }
        (AccountType::Lurker, Action::Message) => {
            Err(lurker_denial("Lurkers cannot send messages."))
        }
        (AccountType::Lurker, Action::Upload) => {
            Err(lurker_denial("Lurkers cannot upload videos."))
        }
        (
            AccountType::Founder | AccountType::Builder | AccountType::Lurker,
            Action::ExpressInterest,
        ) => Err(Denial::new(
            DenialReason::AccountType,
            "Only investors can express interest.",
        )),
        _ => Ok(()),
    }
}

fn lurker_denial(message: &str) -> Denial {
    Denial::new(DenialReason::AccountType, message).with_hint(Hint::Upgrade)
}

fn check_message(
    actor: &Actor,
    recipient: &Account,
    relationship: &Relationship,
) -> Result<(), Denial> {
    if recipient.id() == actor.id() {
        return Err(Denial::new(
            DenialReason::Unsupported,
            "You cannot message yourself.",
        ));
    }

    match relationship.conversation {
        Some((state, side)) => state.check_send(side),
        // First contact: a recipient who restricts inbound messages must be followed.
        None if !recipient.allows_messages_from_everyone() && !relationship.follows_target => {
            Err(Denial::new(
                DenialReason::MessagingRestricted,
                "This user only accepts messages from people they follow.",
            )
            .with_hint(Hint::Follow))
        }
        None => Ok(()),
    }
}

const fn account_label(account_type: AccountType) -> &'static str {
    match account_type {
        AccountType::Founder => "Founder",
        AccountType::Builder => "Builder",
        AccountType::Investor => "Investor",
        AccountType::Lurker => "Lurker",
    }
}

const fn kind_label(kind: VideoKind) -> &'static str {
    match kind {
        VideoKind::Pitch => "pitch",
        VideoKind::Demo => "demo",
        VideoKind::General => "general",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{account, investor, t0, video, with_tier};
    use pitchlane_db::entities::{
        investor_verification::VerificationStatus, subscription::SubscriptionTier,
    };

    fn gate() -> PermissionGate {
        PermissionGate::new(Arc::new(PolicySettings::default()))
    }

    fn actor(account: Account) -> Actor {
        Actor::new(account, &PolicySettings::default(), t0())
    }

    fn draft(kind: VideoKind, visibility: VisibilityClass, posts_today: u64) -> VideoDraft {
        VideoDraft {
            kind,
            visibility,
            posts_today,
        }
    }

    #[test]
    fn test_lurker_cannot_like() {
        let clip = video("v1", "fdr", VisibilityClass::Public);
        let lurker = actor(account("lrk", AccountType::Lurker));

        let denial = gate()
            .can_act(&lurker, Action::Like, &Target::Video(&clip))
            .unwrap_err();
        assert_eq!(denial.reason, DenialReason::AccountType);
        assert_eq!(denial.message, "Lurkers cannot like videos.");
        assert!(gate()
            .can_act(&lurker, Action::View, &Target::Video(&clip))
            .is_ok());
    }

    #[test]
    fn test_unverified_investor_cannot_comment() {
        let clip = video("v1", "fdr", VisibilityClass::Public);
        let pending = actor(investor("inv", VerificationStatus::Pending, false));

        let denial = gate()
            .can_act(&pending, Action::Comment, &Target::Video(&clip))
            .unwrap_err();
        assert_eq!(denial.reason, DenialReason::VerificationRequired);
        assert_eq!(denial.message, "Verify your profile to comment.");
        assert_eq!(denial.hint, Some(Hint::Verify));
    }

    #[test]
    fn test_block_vetoes_messaging_first() {
        let founder = actor(account("fdr", AccountType::Founder));
        let lurker = actor(account("lrk", AccountType::Lurker));
        let other = account("bld", AccountType::Builder);
        let relationship = Relationship {
            blocked: true,
            follows_target: true,
            conversation: Some((ConversationState::Active, Side::Initiator)),
        };
        let target = Target::User {
            account: &other,
            relationship,
        };

        for sender in [&founder, &lurker] {
            assert_eq!(
                gate()
                    .can_act(sender, Action::Message, &target)
                    .unwrap_err()
                    .reason,
                DenialReason::Blocked
            );
        }
        assert_eq!(
            gate()
                .can_act(&founder, Action::Follow, &target)
                .unwrap_err()
                .reason,
            DenialReason::Blocked
        );
    }

    #[test]
    fn test_restricted_recipient_requires_follow_for_first_contact() {
        let sender = actor(account("fdr", AccountType::Founder));
        let mut recipient = account("bld", AccountType::Builder);
        if let Some(profile) = recipient.profile.as_mut() {
            profile.allow_messages_from_everyone = false;
        }

        let cold = Target::User {
            account: &recipient,
            relationship: Relationship::default(),
        };
        let denial = gate().can_act(&sender, Action::Message, &cold).unwrap_err();
        assert_eq!(denial.reason, DenialReason::MessagingRestricted);
        assert_eq!(denial.hint, Some(Hint::Follow));

        let following = Target::User {
            account: &recipient,
            relationship: Relationship {
                follows_target: true,
                ..Relationship::default()
            },
        };
        assert!(gate().can_act(&sender, Action::Message, &following).is_ok());

        // An active conversation bypasses the privacy setting.
        let ongoing = Target::User {
            account: &recipient,
            relationship: Relationship {
                conversation: Some((ConversationState::Active, Side::Recipient)),
                ..Relationship::default()
            },
        };
        assert!(gate().can_act(&sender, Action::Message, &ongoing).is_ok());
    }

    #[test]
    fn test_pending_request_blocks_follow_up_messages() {
        let sender = actor(investor("inv", VerificationStatus::Approved, false));
        let founder = account("fdr", AccountType::Founder);
        let target = Target::User {
            account: &founder,
            relationship: Relationship {
                conversation: Some((ConversationState::Request, Side::Initiator)),
                ..Relationship::default()
            },
        };

        let denial = gate().can_act(&sender, Action::Message, &target).unwrap_err();
        assert_eq!(denial.reason, DenialReason::ConversationPending);
        assert_eq!(denial.hint, Some(Hint::WaitForAcceptance));
    }

    #[test]
    fn test_upload_allow_list_per_kind() {
        let builder = actor(account("bld", AccountType::Builder));
        let investor = actor(investor("inv", VerificationStatus::Approved, true));
        let lurker = actor(account("lrk", AccountType::Lurker));

        let pitch = draft(VideoKind::Pitch, VisibilityClass::Public, 0);
        let demo = draft(VideoKind::Demo, VisibilityClass::Public, 0);
        let general = draft(VideoKind::General, VisibilityClass::Public, 0);

        assert_eq!(
            gate()
                .can_act(&builder, Action::Upload, &Target::Draft(&pitch))
                .unwrap_err()
                .reason,
            DenialReason::ContentTypeRestricted
        );
        assert!(gate()
            .can_act(&builder, Action::Upload, &Target::Draft(&demo))
            .is_ok());
        assert!(gate()
            .can_act(&investor, Action::Upload, &Target::Draft(&demo))
            .is_err());
        assert!(gate()
            .can_act(&investor, Action::Upload, &Target::Draft(&general))
            .is_ok());
        assert_eq!(
            gate()
                .can_act(&lurker, Action::Upload, &Target::Draft(&general))
                .unwrap_err()
                .reason,
            DenialReason::AccountType
        );
    }

    #[test]
    fn test_daily_cap_depends_on_tier() {
        let free = actor(account("fdr", AccountType::Founder));
        let pro = actor(with_tier(
            account("pro", AccountType::Founder),
            SubscriptionTier::FounderPro,
        ));

        let third = draft(VideoKind::Pitch, VisibilityClass::Public, 2);
        let fourth = draft(VideoKind::Pitch, VisibilityClass::Public, 3);
        let eleventh = draft(VideoKind::Pitch, VisibilityClass::Public, 10);

        assert!(gate()
            .can_act(&free, Action::Upload, &Target::Draft(&third))
            .is_ok());
        let denial = gate()
            .can_act(&free, Action::Upload, &Target::Draft(&fourth))
            .unwrap_err();
        assert_eq!(denial.reason, DenialReason::DailyPostLimit);
        assert_eq!(denial.hint, Some(Hint::Upgrade));

        assert!(gate()
            .can_act(&pro, Action::Upload, &Target::Draft(&fourth))
            .is_ok());
        assert_eq!(
            gate()
                .can_act(&pro, Action::Upload, &Target::Draft(&eleventh))
                .unwrap_err()
                .hint,
            None
        );
    }

    #[test]
    fn test_premium_gates_visibility_and_analytics() {
        let free = actor(account("fdr", AccountType::Founder));
        let pro = actor(with_tier(
            account("fdr", AccountType::Founder),
            SubscriptionTier::FounderPro,
        ));
        let gated = draft(VideoKind::Pitch, VisibilityClass::InvestorsOnly, 0);
        let own = video("v1", "fdr", VisibilityClass::Public);
        let foreign = video("v2", "someone", VisibilityClass::Public);

        assert_eq!(
            gate()
                .can_act(&free, Action::Upload, &Target::Draft(&gated))
                .unwrap_err()
                .reason,
            DenialReason::PremiumRequired
        );
        assert!(gate()
            .can_act(&pro, Action::Upload, &Target::Draft(&gated))
            .is_ok());

        assert!(gate()
            .can_act(&free, Action::ViewAnalytics, &Target::Video(&own))
            .is_err());
        assert!(gate()
            .can_act(&pro, Action::ViewAnalytics, &Target::Video(&own))
            .is_ok());
        assert_eq!(
            gate()
                .can_act(&pro, Action::ViewAnalytics, &Target::Video(&foreign))
                .unwrap_err()
                .reason,
            DenialReason::NotOwner
        );
    }

    #[test]
    fn test_express_interest_rules() {
        let approved = actor(investor("inv", VerificationStatus::Approved, false));
        let founder = actor(account("fdr", AccountType::Founder));
        let pitch = video("v1", "fdr", VisibilityClass::Public);

        assert!(gate()
            .can_act(&approved, Action::ExpressInterest, &Target::Video(&pitch))
            .is_ok());
        assert_eq!(
            gate()
                .can_act(&founder, Action::ExpressInterest, &Target::Video(&pitch))
                .unwrap_err()
                .message,
            "Only investors can express interest."
        );
    }

    #[test]
    fn test_inactive_accounts_cannot_act() {
        let mut account = account("fdr", AccountType::Founder);
        account.user.is_active = false;
        let clip = video("v1", "x", VisibilityClass::Public);

        assert_eq!(
            gate()
                .can_act(&actor(account), Action::View, &Target::Video(&clip))
                .unwrap_err()
                .reason,
            DenialReason::Inactive
        );
    }

    #[test]
    fn test_mismatched_target_is_unsupported() {
        let founder = actor(account("fdr", AccountType::Founder));
        let other = account("bld", AccountType::Builder);
        let target = Target::User {
            account: &other,
            relationship: Relationship::default(),
        };

        assert_eq!(
            gate()
                .can_act(&founder, Action::Like, &target)
                .unwrap_err()
                .reason,
            DenialReason::Unsupported
        );
    }
}
