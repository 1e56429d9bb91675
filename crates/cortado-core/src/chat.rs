use std::sync::Arc;

use uuid::Uuid;

use cortado_store::Store;
use cortado_types::models::{Conversation, Message};

use crate::conversation;
use crate::error::AppError;

/// Direct-message screen: fetch-and-aggregate, send, and read receipts.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn Store>,
    user_id: Uuid,
}

impl ChatService {
    pub(crate) fn new(store: Arc<dyn Store>, user_id: Uuid) -> Self {
        Self { store, user_id }
    }

    /// The full pipeline: fetch the message snapshot, aggregate it, then run
    /// the single batch lookup for counterparties with no embedded profile.
    /// All-or-nothing — a failing lookup discards the partial aggregation.
    pub async fn conversations(&self) -> Result<Vec<Conversation>, AppError> {
        let messages = self.store.messages_touching(self.user_id).await?;
        let aggregation = conversation::aggregate(self.user_id, &messages)?;

        let fetched = if aggregation.missing_profiles.is_empty() {
            Vec::new()
        } else {
            self.store.profiles_by_ids(&aggregation.missing_profiles).await?
        };

        Ok(conversation::finalize(aggregation, &fetched))
    }

    pub async fn send(&self, to: Uuid, content: &str) -> Result<Message, AppError> {
        if to == self.user_id {
            return Err(AppError::SelfTarget);
        }
        Ok(self.store.insert_message(self.user_id, to, content).await?)
    }

    /// Open one thread for display: its messages oldest-first, with everything
    /// the counterparty sent flagged as read.
    pub async fn open_thread(&self, counterparty: Uuid) -> Result<Vec<Message>, AppError> {
        let mut messages: Vec<Message> = self
            .store
            .messages_touching(self.user_id)
            .await?
            .into_iter()
            .map(|m| m.message)
            .filter(|m| m.counterparty(self.user_id) == Some(counterparty))
            .collect();
        messages.sort_by_key(|m| m.created_at);

        self.mark_read(counterparty).await?;
        Ok(messages)
    }

    /// Flag every unread message from `counterparty` as read.
    pub async fn mark_read(&self, counterparty: Uuid) -> Result<usize, AppError> {
        Ok(self
            .store
            .mark_conversation_read(self.user_id, counterparty)
            .await?)
    }
}
