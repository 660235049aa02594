//! Application configuration.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Interaction policy tables.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Realtime registry configuration.
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Policy tables consumed by the interaction engine.
///
/// Values are kept textual here and validated into typed settings by the core crate.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// IANA timezone defining local midnight and calendar month boundaries.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Monthly caps on messages sent to investors.
    #[serde(default)]
    pub monthly_investor_messages: MonthlyMessageLimits,
    /// Daily caps on uploaded videos.
    #[serde(default)]
    pub daily_posts: DailyPostLimits,
    /// Subscription tiers treated as premium.
    #[serde(default = "default_premium_tiers")]
    pub premium_tiers: Vec<String>,
    /// Visibility classes only premium uploaders may publish to.
    #[serde(default = "default_premium_visibility")]
    pub premium_visibility: Vec<String>,
    /// Account types allowed to upload each video kind.
    #[serde(default = "default_upload_roles")]
    pub upload_roles: HashMap<String, Vec<String>>,
    /// Maximum video duration in seconds.
    #[serde(default = "default_max_video_duration_secs")]
    pub max_video_duration_secs: u32,
}

/// Per-role monthly limits on investor-directed messages.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MonthlyMessageLimits {
    #[serde(default = "default_founder_monthly")]
    pub founder: u32,
    #[serde(default = "default_builder_monthly")]
    pub builder: u32,
}

/// Per-tier daily posting limits.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DailyPostLimits {
    #[serde(default = "default_free_daily")]
    pub free: u32,
    #[serde(default = "default_premium_daily")]
    pub premium: u32,
}

/// Realtime fan-out configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RealtimeConfig {
    /// Buffered events per user channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Seconds between sweeps of channels without subscribers.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_timezone() -> String {
    "UTC".to_string()
}

const fn default_founder_monthly() -> u32 {
    3
}

const fn default_builder_monthly() -> u32 {
    5
}

const fn default_free_daily() -> u32 {
    3
}

const fn default_premium_daily() -> u32 {
    10
}

fn default_premium_tiers() -> Vec<String> {
    vec![
        "founder_pro".to_string(),
        "investor_pro".to_string(),
        "stealth_mode".to_string(),
    ]
}

fn default_premium_visibility() -> Vec<String> {
    vec!["investors_only".to_string()]
}

fn default_upload_roles() -> HashMap<String, Vec<String>> {
    HashMap::from([
        ("pitch".to_string(), vec!["founder".to_string()]),
        (
            "demo".to_string(),
            vec!["founder".to_string(), "builder".to_string()],
        ),
        (
            "general".to_string(),
            vec![
                "founder".to_string(),
                "builder".to_string(),
                "investor".to_string(),
            ],
        ),
    ])
}

const fn default_max_video_duration_secs() -> u32 {
    300
}

const fn default_channel_capacity() -> usize {
    100
}

const fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for MonthlyMessageLimits {
    fn default() -> Self {
        Self {
            founder: default_founder_monthly(),
            builder: default_builder_monthly(),
        }
    }
}

impl Default for DailyPostLimits {
    fn default() -> Self {
        Self {
            free: default_free_daily(),
            premium: default_premium_daily(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            monthly_investor_messages: MonthlyMessageLimits::default(),
            daily_posts: DailyPostLimits::default(),
            premium_tiers: default_premium_tiers(),
            premium_visibility: default_premium_visibility(),
            upload_roles: default_upload_roles(),
            max_video_duration_secs: default_max_video_duration_secs(),
        }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `PITCHLANE_ENV`)
    /// 3. Environment variables with `PITCHLANE__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("PITCHLANE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PITCHLANE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("PITCHLANE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
