//! Typed policy tables.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use pitchlane_common::{AppError, AppResult, PolicyConfig};
use pitchlane_db::entities::{
    subscription::SubscriptionTier,
    user::AccountType,
    video::{VideoKind, VisibilityClass},
};
use sea_orm::ActiveEnum;

/// Policy tables after validation of [`PolicyConfig`].
#[derive(Debug, Clone)]
pub struct PolicySettings {
    /// Defines local midnight and calendar month boundaries.
    pub timezone: Tz,
    pub founder_monthly_messages: u32,
    pub builder_monthly_messages: u32,
    pub daily_posts_free: u32,
    pub daily_posts_premium: u32,
    pub premium_tiers: HashSet<SubscriptionTier>,
    pub premium_visibility: HashSet<VisibilityClass>,
    pub upload_roles: HashMap<VideoKind, HashSet<AccountType>>,
    pub max_video_duration_secs: u32,
}

fn parse_value<T: ActiveEnum<Value = String>>(what: &str, name: &str) -> AppResult<T> {
    T::try_from_value(&name.to_ascii_lowercase())
        .map_err(|_| AppError::Config(format!("unknown {what} `{name}` in policy config")))
}

impl TryFrom<&PolicyConfig> for PolicySettings {
    type Error = AppError;

    fn try_from(config: &PolicyConfig) -> AppResult<Self> {
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|_| AppError::Config(format!("unknown timezone `{}`", config.timezone)))?;

        let premium_tiers = config
            .premium_tiers
            .iter()
            .map(|name| parse_value::<SubscriptionTier>("subscription tier", name))
            .collect::<AppResult<HashSet<_>>>()?;
        if premium_tiers.contains(&SubscriptionTier::Free) {
            return Err(AppError::Config(
                "the free tier cannot be a premium tier".to_string(),
            ));
        }

        let premium_visibility = config
            .premium_visibility
            .iter()
            .map(|name| parse_value::<VisibilityClass>("visibility class", name))
            .collect::<AppResult<HashSet<_>>>()?;

        let mut upload_roles = HashMap::new();
        for (kind, roles) in &config.upload_roles {
            let kind = parse_value::<VideoKind>("video kind", kind)?;
            let roles = roles
                .iter()
                .map(|role| parse_value::<AccountType>("account type", role))
                .collect::<AppResult<HashSet<_>>>()?;
            upload_roles.insert(kind, roles);
        }

        Ok(Self {
            timezone,
            founder_monthly_messages: config.monthly_investor_messages.founder,
            builder_monthly_messages: config.monthly_investor_messages.builder,
            daily_posts_free: config.daily_posts.free,
            daily_posts_premium: config.daily_posts.premium,
            premium_tiers,
            premium_visibility,
            upload_roles,
            max_video_duration_secs: config.max_video_duration_secs,
        })
    }
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            founder_monthly_messages: 3,
            builder_monthly_messages: 5,
            daily_posts_free: 3,
            daily_posts_premium: 10,
            premium_tiers: HashSet::from([
                SubscriptionTier::FounderPro,
                SubscriptionTier::InvestorPro,
                SubscriptionTier::StealthMode,
            ]),
            premium_visibility: HashSet::from([VisibilityClass::InvestorsOnly]),
            upload_roles: HashMap::from([
                (VideoKind::Pitch, HashSet::from([AccountType::Founder])),
                (
                    VideoKind::Demo,
                    HashSet::from([AccountType::Founder, AccountType::Builder]),
                ),
                (
                    VideoKind::General,
                    HashSet::from([
                        AccountType::Founder,
                        AccountType::Builder,
                        AccountType::Investor,
                    ]),
                ),
            ]),
            max_video_duration_secs: 300,
        }
    }
}

impl PolicySettings {
    /// Monthly cap on investor-directed messages for an account type.
    ///
    /// `None` for account types the monthly counter does not apply to.
    #[must_use]
    pub const fn monthly_message_cap(&self, account_type: AccountType) -> Option<u32> {
        match account_type {
            AccountType::Founder => Some(self.founder_monthly_messages),
            AccountType::Builder => Some(self.builder_monthly_messages),
            AccountType::Investor | AccountType::Lurker => None,
        }
    }

    /// Daily posting cap for a premium or free uploader.
    #[must_use]
    pub const fn daily_post_cap(&self, premium: bool) -> u32 {
        if premium {
            self.daily_posts_premium
        } else {
            self.daily_posts_free
        }
    }

    /// Whether `account_type` may upload videos of `kind`.
    #[must_use]
    pub fn may_upload(&self, kind: VideoKind, account_type: AccountType) -> bool {
        self.upload_roles
            .get(&kind)
            .is_some_and(|roles| roles.contains(&account_type))
    }

    /// Local midnight starting the day that contains `now`.
    #[must_use]
    pub fn day_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.with_timezone(&self.timezone).date_naive();
        self.local_midnight(today)
    }

    /// Local midnight of the first day of the month after the one containing `now`.
    pub fn next_month_start(&self, now: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        let today = now.with_timezone(&self.timezone).date_naive();
        let first = today
            .with_day(1)
            .and_then(|d| d.checked_add_months(Months::new(1)))
            .ok_or_else(|| AppError::Internal(format!("no month follows {today}")))?;
        Ok(self.local_midnight(first))
    }

    fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        // Some zones skip midnight on DST changes; take the first hour that exists.
        (0..3)
            .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
            .find_map(|time| {
                self.timezone
                    .from_local_datetime(&date.and_time(time))
                    .earliest()
            })
            .map_or_else(
                || date.and_time(NaiveTime::MIN).and_utc(),
                |local| local.with_timezone(&Utc),
            )
    }
}
