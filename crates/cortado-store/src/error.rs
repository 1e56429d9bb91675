use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("store lock poisoned")]
    Lock,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("corrupt {entity} row: {detail}")]
    Corrupt {
        entity: &'static str,
        detail: String,
    },
}

impl StoreError {
    pub(crate) fn corrupt(entity: &'static str, detail: impl ToString) -> Self {
        Self::Corrupt {
            entity,
            detail: detail.to_string(),
        }
    }
}
