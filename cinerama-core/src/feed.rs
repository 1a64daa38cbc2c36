use async_trait::async_trait;
use cinerama_shared::SeatChangeEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::ApiResult;

/// Live seat-state fan-out for a showing. Delivery is at-least-once and
/// unordered; consumers must treat each event as the latest known status
/// for that seat, never as a delta. Selected at startup; when no push
/// channel exists, [`NoopSeatFeed`] degrades the system to relying on
/// direct hold/release responses alone.
#[async_trait]
pub trait SeatFeed: Send + Sync {
    async fn subscribe(&self, showing_id: Uuid) -> ApiResult<FeedSubscription>;
}

/// A live subscription. Dropping it (or calling [`close`](Self::close))
/// unsubscribes and stops the producer task.
pub struct FeedSubscription {
    events: mpsc::Receiver<SeatChangeEvent>,
    // Held open so an idle subscription pends instead of ending
    _keepalive: Option<mpsc::Sender<SeatChangeEvent>>,
    task: Option<JoinHandle<()>>,
}

impl FeedSubscription {
    /// Subscription backed by a producer task pumping into `events`
    pub fn from_task(events: mpsc::Receiver<SeatChangeEvent>, task: JoinHandle<()>) -> Self {
        Self {
            events,
            _keepalive: None,
            task: Some(task),
        }
    }

    /// Subscription that never yields an event
    pub fn idle() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            events: rx,
            _keepalive: Some(tx),
            task: None,
        }
    }

    /// Next event; `None` once the subscription is closed
    pub async fn next(&mut self) -> Option<SeatChangeEvent> {
        self.events.recv().await
    }

    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.events.close();
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Degraded-mode feed: subscribes successfully but never delivers anything
pub struct NoopSeatFeed;

#[async_trait]
impl SeatFeed for NoopSeatFeed {
    async fn subscribe(&self, showing_id: Uuid) -> ApiResult<FeedSubscription> {
        tracing::debug!(%showing_id, "no live seat channel configured, running degraded");
        Ok(FeedSubscription::idle())
    }
}
