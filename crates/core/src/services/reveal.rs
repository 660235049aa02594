//! Reveal ledger.
//!
//! Append-only record of which founders may see which private investors.
//! Reveals are written in the same batch as the action that triggers them
//! (accepting an interest or a message request, commenting while private)
//! and are never removed.

use pitchlane_common::{AppError, AppResult};
use pitchlane_db::{
    Account, Change,
    entities::{profile_reveal, user::AccountType},
};

use super::{Batch, ServiceContext};
use crate::policy::reveal::{self, PartyView};

#[derive(Clone)]
pub struct RevealLedger {
    ctx: ServiceContext,
}

impl RevealLedger {
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Change recording that `investor_id` is visible to `founder_id`.
    ///
    /// Idempotent per pair; meant to be committed with the triggering action.
    #[must_use]
    pub fn record(&self, investor_id: &str, founder_id: &str) -> Change {
        let now = self.ctx.now();
        Change::UpsertReveal(profile_reveal::Model {
            id: self.ctx.id_gen.generate_at(now),
            investor_id: investor_id.to_string(),
            founder_id: founder_id.to_string(),
            created_at: now,
        })
    }

    /// Reveal an investor to a founder on its own.
    pub async fn reveal(&self, investor_id: &str, founder_id: &str) -> AppResult<()> {
        let investor = self.ctx.account(investor_id).await?;
        let founder = self.ctx.account(founder_id).await?;
        if investor.account_type() != AccountType::Investor
            || founder.account_type() != AccountType::Founder
        {
            return Err(AppError::BadRequest(
                "Reveals go from an investor to a founder".to_string(),
            ));
        }

        let mut batch = Batch::new();
        batch.push(self.record(investor_id, founder_id));
        self.ctx.commit(batch).await?;

        tracing::info!(investor_id = %investor_id, founder_id = %founder_id, "Investor revealed");
        Ok(())
    }

    /// Whether the pair has a recorded reveal.
    pub async fn is_revealed_to(&self, investor_id: &str, founder_id: &str) -> AppResult<bool> {
        self.ctx.store.is_revealed(investor_id, founder_id).await
    }

    /// Render `subject` as `viewer_id` may see it.
    ///
    /// `contextual` grants disclosure for situation-specific reasons, such as
    /// an accepted interest or a conversation already flagged revealed.
    pub async fn view_of(
        &self,
        subject: &Account,
        viewer_id: Option<&str>,
        contextual: bool,
    ) -> AppResult<PartyView> {
        if !reveal::needs_reveal(subject, viewer_id) || contextual {
            return Ok(reveal::present(subject, true));
        }

        let revealed = match viewer_id {
            Some(viewer_id) => self.is_revealed_to(subject.id(), viewer_id).await?,
            None => false,
        };
        let disclosed = reveal::discloses(subject, viewer_id, revealed, contextual);
        Ok(reveal::present(subject, disclosed))
    }
}
