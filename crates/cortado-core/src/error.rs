use thiserror::Error;
use uuid::Uuid;

use cortado_store::StoreError;
use cortado_types::models::{ConnectionStatus, MeetingStatus};

/// Application-level failures. Store failures pass through unchanged; the
/// rest are per-action guard violations, surfaced to the caller and never
/// retried (there is no optimistic local state to roll back).
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("user {user} is not a participant of {entity} {id}")]
    NotParticipant {
        entity: &'static str,
        user: Uuid,
        id: Uuid,
    },

    #[error("only the requested party can respond to connection {id}")]
    NotRequested { id: Uuid },

    #[error("connection {id} is already {status}")]
    ConnectionSettled {
        id: Uuid,
        status: ConnectionStatus,
    },

    #[error("meeting {id} cannot move from {from} to {to}")]
    MeetingTransition {
        id: Uuid,
        from: MeetingStatus,
        to: MeetingStatus,
    },

    #[error("a request from {requester} to {requested} already exists")]
    DuplicateRequest { requester: Uuid, requested: Uuid },

    #[error("action cannot target the signed-in user")]
    SelfTarget,

    #[error("message {id} does not involve the current user")]
    ForeignMessage { id: Uuid },
}
