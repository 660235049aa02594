//! Repositories over the pitchlane entities.
//!
//! Reads run on the repository's pooled connection. Writes are associated
//! functions taking the connection explicitly, so a whole change batch can
//! run inside one transaction.

pub mod blocking;
pub mod conversation;
pub mod engagement;
pub mod following;
pub mod interest;
pub mod investor;
pub mod message;
pub mod message_limit;
pub mod notification;
pub mod reveal;
pub mod subscription;
pub mod user;
pub mod user_profile;
pub mod video;

pub use blocking::BlockingRepository;
pub use conversation::ConversationRepository;
pub use engagement::EngagementRepository;
pub use following::FollowingRepository;
pub use interest::InterestRepository;
pub use investor::InvestorRepository;
pub use message::MessageRepository;
pub use message_limit::MessageLimitRepository;
pub use notification::NotificationRepository;
pub use reveal::RevealRepository;
pub use subscription::SubscriptionRepository;
pub use user::UserRepository;
pub use user_profile::UserProfileRepository;
pub use video::VideoRepository;

use pitchlane_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map a write error, surfacing unique-key violations as [`AppError::Conflict`].
pub(crate) fn write_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::Conflict(detail),
        _ => AppError::Database(err.to_string()),
    }
}

/// Map a read error.
pub(crate) fn read_err(err: DbErr) -> AppError {
    AppError::Database(err.to_string())
}
