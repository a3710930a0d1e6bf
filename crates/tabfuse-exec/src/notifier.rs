//! Status Notifier: fire-and-forget broadcast of status changes.
//!
//! Delivery is at-most-once. Subscribers only see events published after
//! they subscribed; a subscriber that falls more than `capacity` events
//! behind loses the oldest ones. Publishing never blocks and never fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use tabfuse_core::id::TaskId;
use tabfuse_core::task::TaskStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub task_id: TaskId,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

impl StatusEvent {
    pub fn new(task_id: TaskId, status: TaskStatus) -> Self {
        Self {
            task_id,
            status,
            reason: None,
            at: Utc::now(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct StatusNotifier {
    tx: broadcast::Sender<StatusEvent>,
}

impl StatusNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: StatusEvent) {
        // Err only means nobody is listening.
        if self.tx.send(event).is_err() {
            tracing::trace!("status event dropped: no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_silent() {
        let n = StatusNotifier::new(4);
        n.publish(StatusEvent::new(TaskId::new(1), TaskStatus::FetchingData));
        assert_eq!(n.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn late_subscribers_miss_earlier_events() {
        let n = StatusNotifier::new(4);
        n.publish(StatusEvent::new(TaskId::new(1), TaskStatus::FetchingData));
        let mut rx = n.subscribe();
        n.publish(StatusEvent::new(TaskId::new(1), TaskStatus::MergingData));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.status, TaskStatus::MergingData);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn event_wire_shape() {
        let ev = StatusEvent::new(TaskId::new(3), TaskStatus::Failed).with_reason("boom");
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["taskId"], 3);
        assert_eq!(v["status"], "failed");
        assert_eq!(v["reason"], "boom");
    }
}
