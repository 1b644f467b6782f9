//! Fire-and-forget publisher for terminal-state job events.

use tokio::sync::broadcast;

use crate::types::JobEvent;

const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Publishes job completion events to currently-connected subscribers.
///
/// Delivery is at-most-once: subscribers that connect after an event
/// fires never see it, and slow subscribers may miss events when the
/// buffer laps them. This is a liveness optimization only; correctness
/// always flows through polling the durable record store.
#[derive(Debug, Clone)]
pub struct JobNotifier {
    tx: broadcast::Sender<JobEvent>,
}

impl JobNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event. A send error only means nobody is listening,
    /// which is fine.
    pub fn publish(&self, event: JobEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for JobNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
