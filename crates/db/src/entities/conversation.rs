//! Conversation entity (a direct-message thread between two users).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored lifecycle status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    #[sea_orm(string_value = "request")]
    Request,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "blocked")]
    Blocked,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conversation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user whose first message opened the conversation
    pub participant1_id: String,

    pub participant2_id: String,

    /// Both participant ids, sorted and joined; unique per unordered pair
    #[sea_orm(unique)]
    pub pair_key: String,

    pub status: ConversationStatus,

    /// Whether the initiating investor's identity is shown to the other side
    pub is_revealed: bool,

    #[sea_orm(nullable)]
    pub last_message_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

impl Model {
    /// Canonical key for an unordered pair of users.
    #[must_use]
    pub fn pair_key_for(a: &str, b: &str) -> String {
        if a <= b {
            format!("{a}:{b}")
        } else {
            format!("{b}:{a}")
        }
    }

    /// Whether the user takes part in this conversation.
    #[must_use]
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participant1_id == user_id || self.participant2_id == user_id
    }

    /// The other participant, if `user_id` takes part.
    #[must_use]
    pub fn partner_of(&self, user_id: &str) -> Option<&str> {
        if self.participant1_id == user_id {
            Some(&self.participant2_id)
        } else if self.participant2_id == user_id {
            Some(&self.participant1_id)
        } else {
            None
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::message::Entity")]
    Messages,
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
