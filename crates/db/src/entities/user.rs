//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role a user plays on the network.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[sea_orm(string_value = "founder")]
    Founder,
    #[sea_orm(string_value = "builder")]
    Builder,
    #[sea_orm(string_value = "investor")]
    Investor,
    #[sea_orm(string_value = "lurker")]
    Lurker,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Display name
    #[sea_orm(nullable)]
    pub name: Option<String>,

    pub account_type: AccountType,

    /// Deactivated accounts cannot act
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    /// May review investor verifications
    #[sea_orm(default_value = false)]
    pub is_moderator: bool,

    pub created_at: DateTimeUtc,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::user_profile::Entity")]
    UserProfile,

    #[sea_orm(has_one = "super::subscription::Entity")]
    Subscription,

    #[sea_orm(has_one = "super::investor_verification::Entity")]
    InvestorVerification,

    #[sea_orm(has_one = "super::investor_profile::Entity")]
    InvestorProfile,

    #[sea_orm(has_many = "super::video::Entity")]
    Videos,
}

impl Related<super::user_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserProfile.def()
    }
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl Related<super::investor_verification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvestorVerification.def()
    }
}

impl Related<super::investor_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvestorProfile.def()
    }
}

impl Related<super::video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Videos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
