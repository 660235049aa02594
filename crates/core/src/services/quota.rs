//! Quota ledger.
//!
//! Meters founder and builder messages to investors per calendar month. The
//! counter is only incremented by the [`Change::ReserveQuota`] committed with
//! the message itself, so a failed send never consumes quota.

use chrono::{DateTime, Utc};
use pitchlane_common::{AppError, AppResult};
use pitchlane_db::{
    Change, QuotaReservation,
    entities::{message_limit::MONTHLY_PERIOD, user::AccountType},
};
use serde::Serialize;

use super::ServiceContext;
use crate::policy::{Actor, QuotaDecision, quota};

/// Current standing of a metered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaUsage {
    pub used: u32,
    pub cap: u32,
    pub resets_at: DateTime<Utc>,
}

impl QuotaUsage {
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.cap.saturating_sub(self.used)
    }
}

#[derive(Clone)]
pub struct QuotaLedger {
    ctx: ServiceContext,
}

impl QuotaLedger {
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Decide whether `actor` may message a `target` account and prepare the reservation.
    ///
    /// Returns `None` for unmetered messages. A returned change must be
    /// committed in the same batch as the message; the store re-checks the
    /// cap atomically and fails the batch with `QuotaExceeded` if it was
    /// reached in the meantime.
    pub async fn check_and_reserve(
        &self,
        actor: &Actor,
        target: AccountType,
    ) -> AppResult<Option<Change>> {
        let cap = match quota::classify(actor, target, &self.ctx.settings)? {
            QuotaDecision::Unlimited => return Ok(None),
            QuotaDecision::Metered { cap } => cap,
        };

        let now = self.ctx.now();
        let usage = self.current(actor.id(), cap, now).await?;
        if usage.used >= cap {
            tracing::debug!(user_id = %actor.id(), cap, "Monthly message quota exhausted");
            return Err(AppError::QuotaExceeded {
                message: format!("Monthly limit of {cap} investor messages reached"),
                resets_at: usage.resets_at,
            });
        }

        Ok(Some(Change::ReserveQuota(QuotaReservation {
            id: self.ctx.id_gen.generate_at(now),
            user_id: actor.id().to_string(),
            period: MONTHLY_PERIOD.to_string(),
            cap,
            now,
            next_reset: self.ctx.settings.next_month_start(now)?,
        })))
    }

    /// Usage of a metered user; `None` when their investor messages are unlimited.
    pub async fn usage(&self, user_id: &str) -> AppResult<Option<QuotaUsage>> {
        let actor = self.ctx.actor(user_id).await?;
        if actor.premium {
            return Ok(None);
        }
        let Some(cap) = self
            .ctx
            .settings
            .monthly_message_cap(actor.account.account_type())
        else {
            return Ok(None);
        };

        self.current(user_id, cap, self.ctx.now()).await.map(Some)
    }

    /// Counter as of `now`, treating an elapsed period as reset.
    async fn current(&self, user_id: &str, cap: u32, now: DateTime<Utc>) -> AppResult<QuotaUsage> {
        let row = self
            .ctx
            .store
            .find_message_limit(user_id, MONTHLY_PERIOD)
            .await?;

        Ok(match row {
            Some(row) if row.resets_at > now => QuotaUsage {
                used: u32::try_from(row.count).unwrap_or(0),
                cap,
                resets_at: row.resets_at,
            },
            _ => QuotaUsage {
                used: 0,
                cap,
                resets_at: self.ctx.settings.next_month_start(now)?,
            },
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::SendMessageInput;
    use crate::test_support::{Harness, account, investor, with_tier};
    use chrono::TimeZone;
    use pitchlane_db::entities::{
        investor_verification::VerificationStatus, subscription::SubscriptionTier,
    };

    fn hello() -> SendMessageInput {
        SendMessageInput {
            content: Some("Hello".to_string()),
            attachment_url: None,
        }
    }

    #[tokio::test]
    async fn test_usage_counts_committed_messages() {
        let h = Harness::new();
        h.seed(&account("fdr", AccountType::Founder)).await;
        h.seed(&investor("inv", VerificationStatus::Approved, true)).await;

        let before = h.services.quota.usage("fdr").await.unwrap().unwrap();
        assert_eq!(before.used, 0);
        assert_eq!(before.remaining(), 3);

        h.services.messaging.send("fdr", "inv", hello()).await.unwrap();

        let after = h.services.quota.usage("fdr").await.unwrap().unwrap();
        assert_eq!(after.used, 1);
        assert_eq!(
            after.resets_at,
            Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_unmetered_accounts_have_no_usage() {
        let h = Harness::new();
        h.seed(&with_tier(
            account("pro", AccountType::Founder),
            SubscriptionTier::FounderPro,
        ))
        .await;
        h.seed(&investor("inv", VerificationStatus::Approved, true)).await;
        h.seed(&account("lrk", AccountType::Lurker)).await;

        assert!(h.services.quota.usage("pro").await.unwrap().is_none());
        assert!(h.services.quota.usage("inv").await.unwrap().is_none());
        assert!(h.services.quota.usage("lrk").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exhausted_quota_resets_next_month() {
        let h = Harness::new();
        h.seed(&account("bld", AccountType::Builder)).await;
        h.seed(&investor("inv", VerificationStatus::Approved, true)).await;

        for _ in 0..5 {
            h.services.messaging.send("bld", "inv", hello()).await.unwrap();
        }
        let actor = h.services.quota.ctx.actor("bld").await.unwrap();
        let err = h
            .services
            .quota
            .check_and_reserve(&actor, AccountType::Investor)
            .await
            .unwrap_err();
        let AppError::QuotaExceeded { resets_at, .. } = err else {
            panic!("expected quota exhaustion");
        };
        assert_eq!(resets_at, Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap());

        h.clock.set(resets_at);
        let usage = h.services.quota.usage("bld").await.unwrap().unwrap();
        assert_eq!(usage.used, 0);
        assert!(
            h.services
                .quota
                .check_and_reserve(&actor, AccountType::Investor)
                .await
                .unwrap()
                .is_some()
        );
    }
}
