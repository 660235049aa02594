//! Profile reveal entity.
//!
//! A directed `(investor, founder)` fact: the investor's identity is visible
//! to that founder regardless of public mode. Rows are never deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profile_reveal")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub investor_id: String,

    pub founder_id: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::InvestorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Investor,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FounderId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Founder,
}

impl ActiveModelBehavior for ActiveModel {}
