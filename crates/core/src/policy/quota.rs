//! Monthly message quota classification.

use pitchlane_common::{Denial, DenialReason, Hint};
use pitchlane_db::entities::user::AccountType;

use super::Actor;
use crate::settings::PolicySettings;

/// How a message to a given recipient is metered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// The message does not touch the monthly counter.
    Unlimited,
    /// The message consumes one unit of a counter capped at `cap`.
    Metered { cap: u32 },
}

/// Classify a message from `actor` to a recipient of `target` type.
///
/// Rules apply in order: lurkers are refused outright, investors need
/// approval and are then unlimited, only messages to investors are metered,
/// and an active premium tier lifts the cap.
pub fn classify(
    actor: &Actor,
    target: AccountType,
    settings: &PolicySettings,
) -> Result<QuotaDecision, Denial> {
    match actor.account.account_type() {
        AccountType::Lurker => {
            return Err(Denial::new(
                DenialReason::AccountType,
                "Lurkers cannot send messages.",
            )
            .with_hint(Hint::Upgrade));
        }
        AccountType::Investor if !actor.account.is_approved_investor() => {
            return Err(Denial::new(
                DenialReason::VerificationRequired,
                "Verify your profile to send messages.",
            )
            .with_hint(Hint::Verify));
        }
        AccountType::Investor => return Ok(QuotaDecision::Unlimited),
        AccountType::Founder | AccountType::Builder => {}
    }

    if target != AccountType::Investor || actor.premium {
        return Ok(QuotaDecision::Unlimited);
    }

    Ok(settings
        .monthly_message_cap(actor.account.account_type())
        .map_or(QuotaDecision::Unlimited, |cap| QuotaDecision::Metered { cap }))
}
