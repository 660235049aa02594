//! Identity disclosure of investors.

use pitchlane_db::{Account, entities::user::AccountType};
use serde::Serialize;

/// Profile shown when the subject's identity is disclosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullProfile {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub account_type: AccountType,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub firm_name: Option<String>,
    pub thesis: Option<String>,
}

/// Stub shown in place of a private investor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactedProfile {
    pub id: String,
    pub account_type: AccountType,
    pub is_private: bool,
    /// Present only when the investor opted to show their firm while private.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firm_name: Option<String>,
}

/// What a viewer gets to see of another party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PartyView {
    Full(FullProfile),
    Redacted(RedactedProfile),
}

impl PartyView {
    #[must_use]
    pub const fn is_redacted(&self) -> bool {
        matches!(self, Self::Redacted(_))
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Full(profile) => &profile.id,
            Self::Redacted(stub) => &stub.id,
        }
    }
}

/// Whether disclosure of `subject` to `viewer_id` depends on a recorded reveal.
///
/// Only private investors seen by someone else need the ledger.
#[must_use]
pub fn needs_reveal(subject: &Account, viewer_id: Option<&str>) -> bool {
    subject.account_type() == AccountType::Investor
        && !subject.is_public_mode()
        && viewer_id != Some(subject.id())
}

/// Effective visibility of `subject`'s identity.
///
/// `revealed` is the ledger fact for the pair; `contextual` covers
/// situation-specific exceptions such as an accepted interest.
#[must_use]
pub fn discloses(
    subject: &Account,
    viewer_id: Option<&str>,
    revealed: bool,
    contextual: bool,
) -> bool {
    !needs_reveal(subject, viewer_id) || revealed || contextual
}

/// Render `subject` for a viewer, full or redacted.
#[must_use]
pub fn present(subject: &Account, disclosed: bool) -> PartyView {
    let investor = subject.investor_profile.as_ref();

    if !disclosed {
        return PartyView::Redacted(RedactedProfile {
            id: subject.user.id.clone(),
            account_type: subject.account_type(),
            is_private: true,
            firm_name: investor
                .filter(|p| p.show_firm_when_private)
                .and_then(|p| p.firm_name.clone()),
        });
    }

    let profile = subject.profile.as_ref();
    PartyView::Full(FullProfile {
        id: subject.user.id.clone(),
        username: subject.user.username.clone(),
        name: subject.user.name.clone(),
        account_type: subject.account_type(),
        headline: profile.and_then(|p| p.headline.clone()),
        bio: profile.and_then(|p| p.bio.clone()),
        avatar_url: profile.and_then(|p| p.avatar_url.clone()),
        firm_name: investor.and_then(|p| p.firm_name.clone()),
        thesis: investor.and_then(|p| p.thesis.clone()),
    })
}
