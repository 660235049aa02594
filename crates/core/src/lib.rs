//! Interaction policy engine for pitchlane.
//!
//! [`policy`] holds the pure decision rules (permission gate, visibility,
//! quota classification, reveal rendering, conversation lifecycle).
//! [`services`] loads facts from a [`pitchlane_db::Store`], asks the policy,
//! and commits the outcome together with its notifications.

pub mod policy;
pub mod realtime;
pub mod services;
pub mod settings;

#[cfg(test)]
mod test_support;

pub use realtime::{NotificationEmitter, RealtimeEvent, RealtimeHub};
pub use services::*;
pub use settings::PolicySettings;
