use std::sync::Arc;

use uuid::Uuid;

use cortado_store::Store;
use cortado_types::api::ConnectionQuery;
use cortado_types::models::{Connection, ConnectionStatus};

use crate::error::AppError;

/// Connection-request screen. The store holds the edges; this layer enforces
/// who may transition them: only the requested party responds, and a settled
/// request never moves again.
#[derive(Clone)]
pub struct ConnectionsService {
    store: Arc<dyn Store>,
    user_id: Uuid,
}

impl ConnectionsService {
    pub(crate) fn new(store: Arc<dyn Store>, user_id: Uuid) -> Self {
        Self { store, user_id }
    }

    pub async fn request(&self, requested_id: Uuid) -> Result<Connection, AppError> {
        if requested_id == self.user_id {
            return Err(AppError::SelfTarget);
        }

        let existing = self
            .store
            .list_connections(ConnectionQuery {
                requester: Some(self.user_id),
                requested: Some(requested_id),
                ..Default::default()
            })
            .await?;
        if !existing.is_empty() {
            return Err(AppError::DuplicateRequest {
                requester: self.user_id,
                requested: requested_id,
            });
        }

        Ok(self.store.insert_connection(self.user_id, requested_id).await?)
    }

    pub async fn accept(&self, connection_id: Uuid) -> Result<Connection, AppError> {
        self.respond(connection_id, ConnectionStatus::Accepted).await
    }

    pub async fn reject(&self, connection_id: Uuid) -> Result<Connection, AppError> {
        self.respond(connection_id, ConnectionStatus::Rejected).await
    }

    async fn respond(
        &self,
        connection_id: Uuid,
        status: ConnectionStatus,
    ) -> Result<Connection, AppError> {
        let edge = self
            .store
            .connection(connection_id)
            .await?
            .ok_or(AppError::NotFound {
                entity: "connection",
                id: connection_id,
            })?;

        if edge.requested_id != self.user_id {
            return Err(AppError::NotRequested { id: connection_id });
        }
        if edge.status.is_terminal() {
            return Err(AppError::ConnectionSettled {
                id: connection_id,
                status: edge.status,
            });
        }

        Ok(self.store.update_connection_status(connection_id, status).await?)
    }

    /// Requests waiting on the signed-in user.
    pub async fn incoming(&self) -> Result<Vec<Connection>, AppError> {
        Ok(self
            .store
            .list_connections(ConnectionQuery {
                requested: Some(self.user_id),
                status: Some(ConnectionStatus::Pending),
                ..Default::default()
            })
            .await?)
    }

    /// Requests the signed-in user sent that are still open.
    pub async fn outgoing(&self) -> Result<Vec<Connection>, AppError> {
        Ok(self
            .store
            .list_connections(ConnectionQuery {
                requester: Some(self.user_id),
                status: Some(ConnectionStatus::Pending),
                ..Default::default()
            })
            .await?)
    }

    /// Established connections in either direction.
    pub async fn accepted(&self) -> Result<Vec<Connection>, AppError> {
        Ok(self
            .store
            .list_connections(ConnectionQuery {
                involving: Some(self.user_id),
                status: Some(ConnectionStatus::Accepted),
                ..Default::default()
            })
            .await?)
    }
}
