//! Notification service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pitchlane_common::{AppResult, IdGenerator};
use pitchlane_db::{
    Change, Store,
    entities::notification::{self, NotificationPriority, NotificationType},
};
use serde_json::Value;

use super::MAX_PAGE;
use crate::realtime::{NotificationEmitter, RealtimeEvent};

/// Builds persistent notifications and pushes them once they are stored.
#[derive(Clone, Default)]
pub struct Notifier {
    emitter: Option<Arc<dyn NotificationEmitter>>,
    id_gen: IdGenerator,
}

impl Notifier {
    /// Create a notifier without realtime delivery.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            emitter: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the realtime emitter.
    pub fn set_emitter(&mut self, emitter: Arc<dyn NotificationEmitter>) {
        self.emitter = Some(emitter);
    }

    /// Build a notification row for `user_id`.
    #[must_use]
    pub fn draft(
        &self,
        user_id: &str,
        notification_type: NotificationType,
        priority: NotificationPriority,
        title: impl Into<String>,
        body: impl Into<String>,
        data: Value,
        at: DateTime<Utc>,
    ) -> notification::Model {
        notification::Model {
            id: self.id_gen.generate_at(at),
            user_id: user_id.to_string(),
            notification_type,
            priority,
            title: title.into(),
            body: body.into(),
            data,
            is_read: false,
            created_at: at,
        }
    }

    /// Push committed notifications to their recipients.
    ///
    /// Failures are logged and swallowed; the stored notification stands.
    pub async fn deliver(&self, notifications: &[notification::Model]) {
        let Some(emitter) = &self.emitter else {
            return;
        };

        for model in notifications {
            if let Err(e) = emitter.emit(&model.user_id, RealtimeEvent::from(model)).await {
                tracing::warn!(
                    error = %e,
                    user_id = %model.user_id,
                    notification_id = %model.id,
                    "Failed to emit realtime notification"
                );
            }
        }
    }
}

/// Changes to commit together, plus the notifications among them.
#[derive(Debug, Default)]
pub struct Batch {
    changes: Vec<Change>,
    notifications: Vec<notification::Model>,
}

impl Batch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    /// Store `model` with the batch and push it after the commit succeeds.
    pub fn notify(&mut self, model: notification::Model) {
        self.changes.push(Change::Notify(model.clone()));
        self.notifications.push(model);
    }

    /// Commit the batch, then deliver its notifications.
    pub async fn commit(self, store: &dyn Store, notifier: &Notifier) -> AppResult<()> {
        store.commit(self.changes).await?;
        notifier.deliver(&self.notifications).await;
        Ok(())
    }
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn Store>,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Get notifications for a user (paginated, newest first).
    pub async fn get_notifications(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<notification::Model>> {
        self.store
            .list_notifications(user_id, limit.min(MAX_PAGE), until_id)
            .await
    }
}
