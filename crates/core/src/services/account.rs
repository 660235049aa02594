//! Account service.

use chrono::{DateTime, Utc};
use pitchlane_common::{AppError, AppResult, Denial, DenialReason};
use pitchlane_db::{
    Account, Change,
    entities::{
        investor_profile,
        investor_verification::{self, VerificationStatus},
        notification::{NotificationPriority, NotificationType},
        subscription::{self, SubscriptionTier},
        user::{self, AccountType},
        user_profile,
    },
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use super::{Batch, ServiceContext};

/// Input for registering an account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterAccountInput {
    #[validate(length(min = 1, max = 32))]
    pub username: String,

    #[validate(length(max = 128))]
    pub name: Option<String>,

    pub account_type: AccountType,
}

/// Input for updating the public profile and messaging settings.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(max = 160))]
    pub headline: Option<String>,

    #[validate(length(max = 2048))]
    pub bio: Option<String>,

    #[validate(url)]
    pub avatar_url: Option<String>,

    pub allow_messages_from_everyone: Option<bool>,
}

/// Input for updating an investor profile.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateInvestorProfileInput {
    #[validate(length(max = 128))]
    pub firm_name: Option<String>,

    #[validate(length(max = 2048))]
    pub thesis: Option<String>,

    pub is_public_mode: Option<bool>,

    pub show_firm_when_private: Option<bool>,
}

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    ctx: ServiceContext,
}

fn new_verification(user_id: &str) -> investor_verification::Model {
    investor_verification::Model {
        user_id: user_id.to_string(),
        status: VerificationStatus::NotSubmitted,
        submitted_at: None,
        reviewed_at: None,
        reviewed_by: None,
        review_note: None,
    }
}

fn new_investor_profile(user_id: &str, at: DateTime<Utc>) -> investor_profile::Model {
    investor_profile::Model {
        user_id: user_id.to_string(),
        firm_name: None,
        thesis: None,
        is_public_mode: false,
        show_firm_when_private: false,
        updated_at: Some(at),
    }
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Get an account by user ID.
    pub async fn get(&self, user_id: &str) -> AppResult<Account> {
        self.ctx.account(user_id).await
    }

    /// Register a new account on the free tier.
    ///
    /// Investors start private with an unsubmitted verification.
    pub async fn register(&self, input: RegisterAccountInput) -> AppResult<Account> {
        input.validate()?;

        if self
            .ctx
            .store
            .find_user_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        let now = self.ctx.now();
        let user_id = self.ctx.id_gen.generate_at(now);

        let user = user::Model {
            id: user_id.clone(),
            username: input.username,
            name: input.name,
            account_type: input.account_type,
            is_active: true,
            is_moderator: false,
            created_at: now,
            updated_at: None,
        };
        let profile = user_profile::Model {
            user_id: user_id.clone(),
            headline: None,
            bio: None,
            avatar_url: None,
            allow_messages_from_everyone: true,
            updated_at: None,
        };
        let subscription = subscription::Model {
            id: self.ctx.id_gen.generate_at(now),
            user_id: user_id.clone(),
            tier: SubscriptionTier::Free,
            current_period_end: None,
            created_at: now,
            updated_at: None,
        };

        let mut batch = Batch::new();
        batch.push(Change::InsertUser(user));
        batch.push(Change::SaveUserProfile(profile));
        batch.push(Change::SaveSubscription(subscription));
        if input.account_type == AccountType::Investor {
            batch.push(Change::SaveVerification(new_verification(&user_id)));
            batch.push(Change::SaveInvestorProfile(new_investor_profile(&user_id, now)));
        }
        self.ctx.commit(batch).await?;

        tracing::info!(user_id = %user_id, account_type = ?input.account_type, "Account registered");
        self.ctx.account(&user_id).await
    }

    /// Switch the account type.
    ///
    /// Becoming an investor creates the verification record and a private
    /// investor profile when they do not exist yet.
    pub async fn switch_account_type(
        &self,
        user_id: &str,
        account_type: AccountType,
    ) -> AppResult<Account> {
        let account = self.ctx.account(user_id).await?;
        if account.account_type() == account_type {
            return Ok(account);
        }

        let now = self.ctx.now();
        let mut batch = Batch::new();
        batch.push(Change::SetAccountType {
            user_id: user_id.to_string(),
            account_type,
            at: now,
        });
        if account_type == AccountType::Investor {
            if account.verification.is_none() {
                batch.push(Change::SaveVerification(new_verification(user_id)));
            }
            if account.investor_profile.is_none() {
                batch.push(Change::SaveInvestorProfile(new_investor_profile(user_id, now)));
            }
        }
        self.ctx.commit(batch).await?;

        tracing::info!(
            user_id = %user_id,
            from = ?account.account_type(),
            to = ?account_type,
            "Account type switched"
        );
        self.ctx.account(user_id).await
    }

    /// Submit an investor for verification.
    pub async fn submit_verification(
        &self,
        user_id: &str,
    ) -> AppResult<investor_verification::Model> {
        let account = self.ctx.account(user_id).await?;
        if account.account_type() != AccountType::Investor {
            return Err(AppError::BadRequest(
                "Only investors can submit a verification".to_string(),
            ));
        }

        match account.verification_status() {
            VerificationStatus::NotSubmitted | VerificationStatus::Rejected => {}
            VerificationStatus::Pending => {
                return Err(AppError::Conflict(
                    "Verification is already pending review".to_string(),
                ));
            }
            VerificationStatus::Approved => {
                return Err(AppError::Conflict("Already verified".to_string()));
            }
        }

        let verification = investor_verification::Model {
            status: VerificationStatus::Pending,
            submitted_at: Some(self.ctx.now()),
            reviewed_at: None,
            reviewed_by: None,
            review_note: None,
            ..new_verification(user_id)
        };

        let mut batch = Batch::new();
        batch.push(Change::SaveVerification(verification.clone()));
        self.ctx.commit(batch).await?;

        Ok(verification)
    }

    /// Approve or reject a pending verification. Moderators only.
    pub async fn review_verification(
        &self,
        moderator_id: &str,
        user_id: &str,
        approve: bool,
        note: Option<String>,
    ) -> AppResult<investor_verification::Model> {
        let moderator = self.ctx.acting_account(moderator_id).await?;
        if !moderator.user.is_moderator {
            return Err(Denial::new(
                DenialReason::ModeratorOnly,
                "Only moderators can review verifications.",
            )
            .into());
        }

        let account = self.ctx.account(user_id).await?;
        let Some(current) = account
            .verification
            .filter(|v| v.status == VerificationStatus::Pending)
        else {
            return Err(AppError::BadRequest(
                "No pending verification for this user".to_string(),
            ));
        };

        let now = self.ctx.now();
        let status = if approve {
            VerificationStatus::Approved
        } else {
            VerificationStatus::Rejected
        };
        let reviewed = investor_verification::Model {
            status,
            reviewed_at: Some(now),
            reviewed_by: Some(moderator_id.to_string()),
            review_note: note,
            ..current
        };

        let (title, body) = if approve {
            ("Verification approved", "You can now message founders and engage with videos.")
        } else {
            ("Verification rejected", "Your verification was not approved. You can resubmit.")
        };

        let mut batch = Batch::new();
        batch.push(Change::SaveVerification(reviewed.clone()));
        batch.notify(self.ctx.notifier.draft(
            user_id,
            NotificationType::VerificationReviewed,
            NotificationPriority::High,
            title,
            body,
            json!({ "status": status }),
            now,
        ));
        self.ctx.commit(batch).await?;

        tracing::info!(user_id = %user_id, moderator_id = %moderator_id, ?status, "Verification reviewed");
        Ok(reviewed)
    }

    /// Update profile fields and the "messages from everyone" setting.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user_profile::Model> {
        input.validate()?;

        let account = self.ctx.account(user_id).await?;
        let current = account.profile.unwrap_or(user_profile::Model {
            user_id: user_id.to_string(),
            headline: None,
            bio: None,
            avatar_url: None,
            allow_messages_from_everyone: true,
            updated_at: None,
        });

        let updated = user_profile::Model {
            headline: input.headline.or(current.headline),
            bio: input.bio.or(current.bio),
            avatar_url: input.avatar_url.or(current.avatar_url),
            allow_messages_from_everyone: input
                .allow_messages_from_everyone
                .unwrap_or(current.allow_messages_from_everyone),
            updated_at: Some(self.ctx.now()),
            ..current
        };

        let mut batch = Batch::new();
        batch.push(Change::SaveUserProfile(updated.clone()));
        self.ctx.commit(batch).await?;

        Ok(updated)
    }

    /// Update an investor profile, including public mode.
    pub async fn update_investor_profile(
        &self,
        user_id: &str,
        input: UpdateInvestorProfileInput,
    ) -> AppResult<investor_profile::Model> {
        input.validate()?;

        let account = self.ctx.account(user_id).await?;
        if account.account_type() != AccountType::Investor {
            return Err(AppError::BadRequest(
                "Only investors have an investor profile".to_string(),
            ));
        }

        let now = self.ctx.now();
        let current = account
            .investor_profile
            .unwrap_or_else(|| new_investor_profile(user_id, now));
        let updated = investor_profile::Model {
            firm_name: input.firm_name.or(current.firm_name),
            thesis: input.thesis.or(current.thesis),
            is_public_mode: input.is_public_mode.unwrap_or(current.is_public_mode),
            show_firm_when_private: input
                .show_firm_when_private
                .unwrap_or(current.show_firm_when_private),
            updated_at: Some(now),
            ..current
        };

        let mut batch = Batch::new();
        batch.push(Change::SaveInvestorProfile(updated.clone()));
        self.ctx.commit(batch).await?;

        Ok(updated)
    }

    /// Record a tier change reported by billing.
    pub async fn apply_subscription(
        &self,
        user_id: &str,
        tier: SubscriptionTier,
        current_period_end: Option<DateTime<Utc>>,
    ) -> AppResult<subscription::Model> {
        let account = self.ctx.account(user_id).await?;
        let now = self.ctx.now();

        let updated = match account.subscription {
            Some(current) => subscription::Model {
                tier,
                current_period_end,
                updated_at: Some(now),
                ..current
            },
            None => subscription::Model {
                id: self.ctx.id_gen.generate_at(now),
                user_id: user_id.to_string(),
                tier,
                current_period_end,
                created_at: now,
                updated_at: Some(now),
            },
        };

        let mut batch = Batch::new();
        batch.push(Change::SaveSubscription(updated.clone()));
        self.ctx.commit(batch).await?;

        tracing::info!(user_id = %user_id, ?tier, "Subscription updated");
        Ok(updated)
    }
}
