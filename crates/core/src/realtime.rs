//! Realtime notification fan-out.
//!
//! A [`RealtimeHub`] is constructed once per process and injected into the
//! services. Each connected user subscribes to exactly one private channel
//! keyed by their user id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use pitchlane_common::{AppResult, RealtimeConfig};
use pitchlane_db::entities::notification::{self, NotificationPriority, NotificationType};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

/// Event pushed to a connected user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RealtimeEvent {
    /// A persistent notification was created.
    #[serde(rename_all = "camelCase")]
    Notification {
        id: String,
        notification_type: NotificationType,
        priority: NotificationPriority,
        title: String,
        body: String,
        data: serde_json::Value,
    },
}

impl From<&notification::Model> for RealtimeEvent {
    fn from(model: &notification::Model) -> Self {
        Self::Notification {
            id: model.id.clone(),
            notification_type: model.notification_type,
            priority: model.priority,
            title: model.title.clone(),
            body: model.body.clone(),
            data: model.data.clone(),
        }
    }
}

/// Pushes events to connected users.
///
/// Delivery is fire-and-forget: users without a live connection simply miss
/// the push and read the persistent notification later.
#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    /// Push an event to a user's private channel.
    async fn emit(&self, user_id: &str, event: RealtimeEvent) -> AppResult<()>;
}

/// Per-user broadcast channels.
#[derive(Clone)]
pub struct RealtimeHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<RealtimeEvent>>>>,
    capacity: usize,
}

impl RealtimeHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new(config: &RealtimeConfig) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: config.channel_capacity.max(1),
        }
    }

    /// Subscribe to a user's channel, creating it on first use.
    pub async fn subscribe(&self, user_id: &str) -> broadcast::Receiver<RealtimeEvent> {
        let mut channels = self.channels.write().await;

        if let Some(sender) = channels.get(user_id) {
            return sender.subscribe();
        }

        let (sender, receiver) = broadcast::channel(self.capacity);
        channels.insert(user_id.to_string(), sender);
        receiver
    }

    /// Subscribe as a stream, skipping events lost to a lagging receiver.
    pub async fn stream(&self, user_id: &str) -> impl Stream<Item = RealtimeEvent> + use<> {
        let receiver = self.subscribe(user_id).await;
        BroadcastStream::new(receiver).filter_map(|result| {
            if let Err(e) = &result {
                tracing::debug!(error = %e, "Realtime receiver lagged");
            }
            result.ok()
        })
    }

    /// Number of users with a live channel.
    pub async fn connected_users(&self) -> usize {
        let channels = self.channels.read().await;
        channels
            .values()
            .filter(|sender| sender.receiver_count() > 0)
            .count()
    }

    /// Drop channels nobody listens to; returns how many were removed.
    pub async fn cleanup(&self) -> usize {
        let mut channels = self.channels.write().await;
        let before = channels.len();
        channels.retain(|_, sender| sender.receiver_count() > 0);
        before - channels.len()
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(&RealtimeConfig::default())
    }
}

#[async_trait]
impl NotificationEmitter for RealtimeHub {
    async fn emit(&self, user_id: &str, event: RealtimeEvent) -> AppResult<()> {
        let channels = self.channels.read().await;
        if let Some(sender) = channels.get(user_id) {
            // A send error only means every receiver is gone.
            let _ = sender.send(event);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn event(id: &str) -> RealtimeEvent {
        RealtimeEvent::Notification {
            id: id.to_string(),
            notification_type: NotificationType::NewMessage,
            priority: NotificationPriority::Normal,
            title: "New message".to_string(),
            body: "hello".to_string(),
            data: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_emit_reaches_only_the_addressed_user() {
        let hub = RealtimeHub::default();
        let mut alice = hub.subscribe("alice").await;
        let mut bob = hub.subscribe("bob").await;

        hub.emit("alice", event("n1")).await.unwrap();

        assert_eq!(alice.try_recv().unwrap(), event("n1"));
        assert!(matches!(bob.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_emit_without_subscriber_is_ok() {
        let hub = RealtimeHub::default();
        assert!(hub.emit("nobody", event("n1")).await.is_ok());
        assert_eq!(hub.connected_users().await, 0);
    }

    #[tokio::test]
    async fn test_cleanup_drops_abandoned_channels() {
        let hub = RealtimeHub::default();
        let kept = hub.subscribe("alice").await;
        drop(hub.subscribe("bob").await);

        assert_eq!(hub.connected_users().await, 1);
        assert_eq!(hub.cleanup().await, 1);
        assert_eq!(hub.cleanup().await, 0);
        drop(kept);
        assert_eq!(hub.cleanup().await, 1);
    }

    #[tokio::test]
    async fn test_stream_yields_events() {
        let hub = RealtimeHub::default();
        let stream = hub.stream("alice").await;
        tokio::pin!(stream);

        hub.emit("alice", event("n1")).await.unwrap();
        assert_eq!(stream.next().await, Some(event("n1")));
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(event("n1")).unwrap();
        assert_eq!(json["type"], "notification");
        assert_eq!(json["notificationType"], "newMessage");
    }
}
