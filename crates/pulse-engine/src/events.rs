//! Live `metric` events.
//!
//! Every successful write is published on a bounded [`tokio::sync::broadcast`]
//! channel owned by the registry. Publishing never blocks: with no receivers
//! the event is not even built, and a subscriber that falls behind skips
//! ahead instead of stalling producers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use pulse_core::error::{Result, TelemetryError};
use pulse_core::{MetricKind, Tags};

/// One recorded observation as seen by listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEvent {
    pub name: String,
    pub kind: MetricKind,
    pub value: f64,
    pub tags: Tags,
    pub timestamp: SystemTime,
}

pub(crate) struct EventBus {
    sender: broadcast::Sender<MetricEvent>,
    emitted: AtomicU64,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            emitted: AtomicU64::new(0),
        }
    }

    /// Publish the event built by `make`, only if someone is listening.
    pub(crate) fn publish_with(&self, make: impl FnOnce() -> MetricEvent) {
        if self.sender.receiver_count() == 0 {
            return;
        }
        self.emitted.fetch_add(1, Ordering::Relaxed);
        // Receivers may all drop between the check and the send.
        let _ = self.sender.send(make());
    }

    pub(crate) fn subscribe(&self) -> MetricSubscriber {
        MetricSubscriber {
            receiver: self.sender.subscribe(),
            missed: 0,
        }
    }

    pub(crate) fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Subscription handle returned by [`crate::MetricRegistry::subscribe`].
pub struct MetricSubscriber {
    receiver: broadcast::Receiver<MetricEvent>,
    missed: u64,
}

impl MetricSubscriber {
    /// Receive the next event, waiting asynchronously.
    ///
    /// Returns `None` once the registry is gone. Lagging skips ahead.
    pub async fn recv(&mut self) -> Option<MetricEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => self.lagged(n),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive an event without waiting.
    pub fn try_recv(&mut self) -> Option<MetricEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => self.lagged(n),
                Err(_) => return None,
            }
        }
    }

    /// Events skipped because this subscriber fell behind.
    pub fn missed(&self) -> u64 {
        self.missed
    }

    fn lagged(&mut self, n: u64) {
        self.missed += n;
        tracing::debug!(skipped = n, "metric subscriber lagged");
    }
}

/// Drive `handler` over every event until the bus closes or `shutdown` fires.
///
/// Handler errors are logged as subscriber failures and the loop keeps
/// going; nothing flows back to the writers.
pub(crate) fn spawn_listener<F>(
    label: String,
    mut sub: MetricSubscriber,
    mut shutdown: watch::Receiver<bool>,
    mut handler: F,
) -> JoinHandle<()>
where
    F: FnMut(&MetricEvent) -> Result<()> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                ev = sub.recv() => ev,
                _ = crate::tasks::stopped(&mut shutdown) => None,
            };
            let Some(event) = event else { break };

            if let Err(e) = handler(&event) {
                let failure = TelemetryError::SubscriberFailure {
                    listener: label.clone(),
                    reason: e.to_string(),
                };
                tracing::warn!(listener = %label, metric = %event.name, error = %failure, "metric listener failed");
            }
        }
        tracing::debug!(listener = %label, "metric listener stopped");
    })
}

