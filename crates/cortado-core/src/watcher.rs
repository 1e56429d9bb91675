use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use cortado_store::Store;
use cortado_types::models::Conversation;

use crate::chat::ChatService;

/// Background task that keeps a conversation snapshot current. Change events
/// for the user are coalesced over a debounce window, and refreshes run
/// strictly one at a time — the loop is sequential, so a burst of inserts
/// costs one fetch, not one per event.
pub struct InboxWatcher {
    rx: watch::Receiver<Vec<Conversation>>,
    handle: JoinHandle<()>,
}

impl InboxWatcher {
    pub fn subscribe(&self) -> watch::Receiver<Vec<Conversation>> {
        self.rx.clone()
    }

    pub fn snapshot(&self) -> Vec<Conversation> {
        self.rx.borrow().clone()
    }

    pub(crate) fn abort(&self) {
        self.handle.abort();
    }
}

pub(crate) fn spawn(store: Arc<dyn Store>, user_id: Uuid, debounce: Duration) -> InboxWatcher {
    let (tx, rx) = watch::channel(Vec::new());
    let chat = ChatService::new(store.clone(), user_id);
    let mut events = store.subscribe();

    let handle = tokio::spawn(async move {
        // Initial load so subscribers start from a real snapshot.
        refresh(&chat, &tx).await;

        loop {
            match events.recv().await {
                Ok(event) if event.receiver_id() == Some(user_id) => {}
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "change feed lagged, forcing refresh");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }

            // Wait out the window, then drain whatever queued behind us.
            tokio::time::sleep(debounce).await;
            loop {
                match events.try_recv() {
                    Ok(_) => continue,
                    Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                    Err(broadcast::error::TryRecvError::Empty) => break,
                    Err(broadcast::error::TryRecvError::Closed) => break,
                }
            }

            refresh(&chat, &tx).await;
        }
    });

    InboxWatcher { rx, handle }
}

async fn refresh(chat: &ChatService, tx: &watch::Sender<Vec<Conversation>>) {
    match chat.conversations().await {
        Ok(conversations) => {
            let _ = tx.send(conversations);
        }
        // Subscribers keep the last good snapshot.
        Err(err) => warn!(error = %err, "inbox refresh failed"),
    }
}
