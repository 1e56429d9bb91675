use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Message;

/// Change notifications published by the store after a successful write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StoreEvent {
    /// A new direct message row was inserted.
    MessageInserted { message: Message },
}

impl StoreEvent {
    /// Returns the user the event should be delivered to, if it is scoped to
    /// one. Subscribers filter on this for the account they serve.
    pub fn receiver_id(&self) -> Option<Uuid> {
        match self {
            Self::MessageInserted { message } => Some(message.receiver_id),
        }
    }
}
