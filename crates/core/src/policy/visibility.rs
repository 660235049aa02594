//! Audience partitioning of content.
//!
//! Listings and single-item fetches both go through this module: a listing
//! narrows the query with [`resolve_visibility_classes`] and then applies
//! [`check_video_visibility`] to every row, exactly as a detail fetch does.

use pitchlane_common::{Denial, DenialReason, Hint};
use pitchlane_db::{
    Account,
    entities::{
        user::AccountType,
        video::{self, VisibilityClass},
    },
};

/// Visibility classes a viewer of the given account type may see.
///
/// `None` is an anonymous viewer. Ownership is not considered here.
#[must_use]
pub const fn resolve_visibility_classes(
    viewer: Option<AccountType>,
) -> &'static [VisibilityClass] {
    match viewer {
        None | Some(AccountType::Lurker) => &[VisibilityClass::Public],
        Some(AccountType::Investor) => &[VisibilityClass::Public, VisibilityClass::InvestorsOnly],
        Some(AccountType::Founder | AccountType::Builder) => {
            &[VisibilityClass::Public, VisibilityClass::Community]
        }
    }
}

/// Decide whether `viewer` may see `video`.
pub fn check_video_visibility(
    viewer: Option<&Account>,
    video: &video::Model,
) -> Result<(), Denial> {
    if viewer.is_some_and(|v| v.id() == video.user_id) {
        return Ok(());
    }

    let account_type = viewer.map(Account::account_type);
    match video.visibility {
        VisibilityClass::Public => Ok(()),
        VisibilityClass::Community => match account_type {
            Some(AccountType::Founder | AccountType::Builder) => Ok(()),
            _ => Err(Denial::new(
                DenialReason::VisibilityRestricted,
                "This video is only visible to founders and builders.",
            )),
        },
        VisibilityClass::InvestorsOnly => match viewer {
            Some(v) if v.is_approved_investor() => Ok(()),
            Some(v) if v.account_type() == AccountType::Investor => Err(Denial::new(
                DenialReason::VerificationRequired,
                "Verify your profile to watch investor-only videos.",
            )
            .with_hint(Hint::Verify)),
            _ => Err(Denial::new(
                DenialReason::VisibilityRestricted,
                "This video is only visible to verified investors.",
            )),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{account, investor, video};
    use pitchlane_db::entities::investor_verification::VerificationStatus;

    const ALL_TYPES: [AccountType; 4] = [
        AccountType::Founder,
        AccountType::Builder,
        AccountType::Investor,
        AccountType::Lurker,
    ];

    #[test]
    fn test_resolver_never_grants_barred_classes() {
        for account_type in ALL_TYPES {
            let classes = resolve_visibility_classes(Some(account_type));
            assert!(classes.contains(&VisibilityClass::Public));
            match account_type {
                AccountType::Investor => {
                    assert!(!classes.contains(&VisibilityClass::Community));
                }
                AccountType::Founder | AccountType::Builder => {
                    assert!(!classes.contains(&VisibilityClass::InvestorsOnly));
                }
                AccountType::Lurker => assert_eq!(classes, &[VisibilityClass::Public]),
            }
        }
        assert_eq!(resolve_visibility_classes(None), &[VisibilityClass::Public]);
    }

    #[test]
    fn test_owner_always_sees_own_video() {
        let owner = account("fdr", AccountType::Founder);
        let clip = video("v1", "fdr", VisibilityClass::InvestorsOnly);
        assert!(check_video_visibility(Some(&owner), &clip).is_ok());
    }

    #[test]
    fn test_community_denied_to_investors_and_lurkers() {
        let clip = video("v1", "fdr", VisibilityClass::Community);
        let approved = investor("inv", VerificationStatus::Approved, true);
        let lurker = account("lrk", AccountType::Lurker);
        let builder = account("bld", AccountType::Builder);

        assert!(check_video_visibility(Some(&approved), &clip).is_err());
        assert!(check_video_visibility(Some(&lurker), &clip).is_err());
        assert!(check_video_visibility(None, &clip).is_err());
        assert!(check_video_visibility(Some(&builder), &clip).is_ok());
    }

    #[test]
    fn test_investors_only_requires_approval() {
        let clip = video("v1", "fdr", VisibilityClass::InvestorsOnly);
        let pending = investor("inv", VerificationStatus::Pending, false);
        let approved = investor("inv2", VerificationStatus::Approved, false);
        let founder = account("other", AccountType::Founder);

        let denial = check_video_visibility(Some(&pending), &clip).unwrap_err();
        assert_eq!(denial.reason, DenialReason::VerificationRequired);
        assert_eq!(denial.hint, Some(Hint::Verify));
        assert!(check_video_visibility(Some(&approved), &clip).is_ok());
        assert_eq!(
            check_video_visibility(Some(&founder), &clip)
                .unwrap_err()
                .reason,
            DenialReason::VisibilityRestricted
        );
    }
}
