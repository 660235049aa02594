//! The account performing an action.

use chrono::{DateTime, Utc};
use pitchlane_db::{Account, entities::subscription};

use crate::settings::PolicySettings;

/// An account together with facts derived from it at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub account: Account,
    /// Holds a premium tier whose period has not ended.
    pub premium: bool,
}

impl Actor {
    /// Evaluate the account's subscription at `now`.
    #[must_use]
    pub fn new(account: Account, settings: &PolicySettings, now: DateTime<Utc>) -> Self {
        let premium = is_premium(account.subscription.as_ref(), settings, now);
        Self { account, premium }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.account.id()
    }
}

/// A non-free tier counts only while its period is open or unbounded.
#[must_use]
pub fn is_premium(
    subscription: Option<&subscription::Model>,
    settings: &PolicySettings,
    now: DateTime<Utc>,
) -> bool {
    subscription.is_some_and(|sub| {
        settings.premium_tiers.contains(&sub.tier)
            && sub.current_period_end.is_none_or(|end| end > now)
    })
}
