//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20260101_000001_create_user_table;
mod m20260101_000002_create_user_profile_table;
mod m20260101_000003_create_subscription_table;
mod m20260101_000004_create_investor_verification_table;
mod m20260101_000005_create_investor_profile_table;
mod m20260101_000006_create_following_table;
mod m20260101_000007_create_blocking_table;
mod m20260101_000008_create_video_table;
mod m20260101_000009_create_video_like_table;
mod m20260101_000010_create_comment_table;
mod m20260101_000011_create_profile_reveal_table;
mod m20260101_000012_create_express_interest_table;
mod m20260101_000013_create_conversation_table;
mod m20260101_000014_create_message_table;
mod m20260101_000015_create_message_limit_table;
mod m20260101_000016_create_notification_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_user_table::Migration),
            Box::new(m20260101_000002_create_user_profile_table::Migration),
            Box::new(m20260101_000003_create_subscription_table::Migration),
            Box::new(m20260101_000004_create_investor_verification_table::Migration),
            Box::new(m20260101_000005_create_investor_profile_table::Migration),
            Box::new(m20260101_000006_create_following_table::Migration),
            Box::new(m20260101_000007_create_blocking_table::Migration),
            Box::new(m20260101_000008_create_video_table::Migration),
            Box::new(m20260101_000009_create_video_like_table::Migration),
            Box::new(m20260101_000010_create_comment_table::Migration),
            Box::new(m20260101_000011_create_profile_reveal_table::Migration),
            Box::new(m20260101_000012_create_express_interest_table::Migration),
            Box::new(m20260101_000013_create_conversation_table::Migration),
            Box::new(m20260101_000014_create_message_table::Migration),
            Box::new(m20260101_000015_create_message_limit_table::Migration),
            Box::new(m20260101_000016_create_notification_table::Migration),
        ]
    }
}
