//! Common utilities and shared types for pitchlane.
//!
//! This crate provides foundational components used across all pitchlane crates:
//!
//! - **Configuration**: Application settings and policy tables via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Time**: Injectable clock via [`TimeSource`]
//!
//! # Example
//!
//! ```no_run
//! use pitchlane_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     println!("{} -> {}", config.policy.timezone, id_gen.generate());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod time;

pub use config::{Config, DailyPostLimits, MonthlyMessageLimits, PolicyConfig, RealtimeConfig};
pub use error::{AppError, AppResult, Denial, DenialReason, Hint};
pub use id::IdGenerator;
pub use time::{Clock, ManualTimeSource, SystemTimeSource, TimeSource};
