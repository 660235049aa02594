//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "camelCase")]
pub enum NotificationType {
    #[sea_orm(string_value = "newMessage")]
    NewMessage,
    #[sea_orm(string_value = "messageRequest")]
    MessageRequest,
    #[sea_orm(string_value = "messageRequestAccepted")]
    MessageRequestAccepted,
    #[sea_orm(string_value = "interestReceived")]
    InterestReceived,
    #[sea_orm(string_value = "interestAccepted")]
    InterestAccepted,
    #[sea_orm(string_value = "videoLiked")]
    VideoLiked,
    #[sea_orm(string_value = "videoCommented")]
    VideoCommented,
    #[sea_orm(string_value = "newFollower")]
    NewFollower,
    #[sea_orm(string_value = "verificationReviewed")]
    VerificationReviewed,
}

/// Delivery priority hint for clients.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "normal")]
    Normal,
    #[sea_orm(string_value = "high")]
    High,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user receiving the notification
    pub user_id: String,

    pub notification_type: NotificationType,

    pub priority: NotificationPriority,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Ids the client needs to deep-link (conversation, video, interest)
    #[sea_orm(column_type = "JsonBinary")]
    pub data: Json,

    #[sea_orm(default_value = false)]
    pub is_read: bool,

    pub created_at: DateTimeUtc,
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
