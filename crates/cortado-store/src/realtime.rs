use tokio::sync::broadcast;

use cortado_types::events::StoreEvent;

/// Fan-out hub for store change notifications. The store publishes an event
/// after each successful insert; every subscriber gets every event and filters
/// for the scope it cares about.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<StoreEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    /// Send to all current subscribers. Dropped if nobody is listening.
    pub fn publish(&self, event: StoreEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
