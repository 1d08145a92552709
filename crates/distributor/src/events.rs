//! Append-only notification log.
//!
//! Every committed claim or sweep appends exactly one event. Live
//! subscribers receive events over a broadcast channel; late subscribers can
//! read the full history with `events()`.

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::DistributorEvent;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct EventLog {
    entries: RwLock<Vec<DistributorEvent>>,
    tx: broadcast::Sender<DistributorEvent>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::from_events(Vec::new())
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a log with existing history.
    pub fn from_events(events: Vec<DistributorEvent>) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(events),
            tx,
        }
    }

    pub(crate) fn append(&self, event: DistributorEvent) {
        self.entries.write().push(event.clone());
        // No receivers is fine: the history above is the source of truth
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DistributorEvent> {
        self.tx.subscribe()
    }

    /// Full history, oldest first.
    pub fn events(&self) -> Vec<DistributorEvent> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
