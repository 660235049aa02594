//! Message limit entity (per-user, per-period message counter).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Period key for investor-directed message limits.
pub const MONTHLY_PERIOD: &str = "monthly";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message_limit")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    pub period: String,

    pub count: i32,

    /// Once passed, `count` is treated as zero
    pub resets_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl ActiveModelBehavior for ActiveModel {}
