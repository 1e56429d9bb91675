use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use cortado_types::api::{ConnectionQuery, MeetingQuery, NewMeeting, NewProfile, ProfilePatch, ProfileQuery};
use cortado_types::events::StoreEvent;
use cortado_types::models::{
    Connection, ConnectionStatus, Meeting, MeetingStatus, Message, MessageWithSender,
    PresenceStatus, UserProfile,
};

use crate::error::StoreError;
use crate::{SqliteStore, queries};

/// The remote-store boundary. Everything the application reads or writes goes
/// through this trait; implementations own durability and change notification.
#[async_trait]
pub trait Store: Send + Sync {
    // -- Profiles --

    async fn create_profile(&self, new: NewProfile) -> Result<UserProfile, StoreError>;
    async fn profile(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError>;
    async fn profile_by_email(&self, email: &str) -> Result<Option<UserProfile>, StoreError>;
    async fn list_profiles(&self, query: ProfileQuery) -> Result<Vec<UserProfile>, StoreError>;
    /// One batch lookup for a set of ids; unresolvable ids are simply absent.
    async fn profiles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserProfile>, StoreError>;
    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<UserProfile, StoreError>;
    async fn set_presence(&self, id: Uuid, status: PresenceStatus) -> Result<(), StoreError>;

    // -- Connections --

    async fn insert_connection(
        &self,
        requester_id: Uuid,
        requested_id: Uuid,
    ) -> Result<Connection, StoreError>;
    async fn connection(&self, id: Uuid) -> Result<Option<Connection>, StoreError>;
    async fn list_connections(&self, query: ConnectionQuery) -> Result<Vec<Connection>, StoreError>;
    async fn update_connection_status(
        &self,
        id: Uuid,
        status: ConnectionStatus,
    ) -> Result<Connection, StoreError>;

    // -- Meetings --

    async fn insert_meeting(&self, new: NewMeeting) -> Result<Meeting, StoreError>;
    async fn meeting(&self, id: Uuid) -> Result<Option<Meeting>, StoreError>;
    async fn list_meetings(&self, query: MeetingQuery) -> Result<Vec<Meeting>, StoreError>;
    async fn update_meeting_status(
        &self,
        id: Uuid,
        status: MeetingStatus,
    ) -> Result<Meeting, StoreError>;

    // -- Messages --

    async fn insert_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Message, StoreError>;
    /// Messages where the user is sender or receiver, newest first, sender
    /// profile expanded on received messages.
    async fn messages_touching(&self, user: Uuid) -> Result<Vec<MessageWithSender>, StoreError>;
    async fn mark_conversation_read(
        &self,
        receiver_id: Uuid,
        sender_id: Uuid,
    ) -> Result<usize, StoreError>;

    // -- Change notifications --

    /// Subscribe to insert events. Subscribers filter by
    /// [`StoreEvent::receiver_id`] for the user they care about.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

#[async_trait]
impl Store for SqliteStore {
    async fn create_profile(&self, new: NewProfile) -> Result<UserProfile, StoreError> {
        self.blocking(move |conn| queries::create_profile(conn, &new)).await
    }

    async fn profile(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        self.blocking(move |conn| queries::get_profile(conn, id)).await
    }

    async fn profile_by_email(&self, email: &str) -> Result<Option<UserProfile>, StoreError> {
        let email = email.to_string();
        self.blocking(move |conn| queries::get_profile_by_email(conn, &email)).await
    }

    async fn list_profiles(&self, query: ProfileQuery) -> Result<Vec<UserProfile>, StoreError> {
        self.blocking(move |conn| queries::list_profiles(conn, &query)).await
    }

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserProfile>, StoreError> {
        let ids = ids.to_vec();
        self.blocking(move |conn| queries::profiles_by_ids(conn, &ids)).await
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<UserProfile, StoreError> {
        self.blocking(move |conn| queries::update_profile(conn, id, &patch)).await
    }

    async fn set_presence(&self, id: Uuid, status: PresenceStatus) -> Result<(), StoreError> {
        self.blocking(move |conn| queries::set_presence(conn, id, status)).await
    }

    async fn insert_connection(
        &self,
        requester_id: Uuid,
        requested_id: Uuid,
    ) -> Result<Connection, StoreError> {
        self.blocking(move |conn| queries::insert_connection(conn, requester_id, requested_id))
            .await
    }

    async fn connection(&self, id: Uuid) -> Result<Option<Connection>, StoreError> {
        self.blocking(move |conn| queries::get_connection(conn, id)).await
    }

    async fn list_connections(&self, query: ConnectionQuery) -> Result<Vec<Connection>, StoreError> {
        self.blocking(move |conn| queries::list_connections(conn, &query)).await
    }

    async fn update_connection_status(
        &self,
        id: Uuid,
        status: ConnectionStatus,
    ) -> Result<Connection, StoreError> {
        self.blocking(move |conn| queries::update_connection_status(conn, id, status)).await
    }

    async fn insert_meeting(&self, new: NewMeeting) -> Result<Meeting, StoreError> {
        self.blocking(move |conn| queries::insert_meeting(conn, &new)).await
    }

    async fn meeting(&self, id: Uuid) -> Result<Option<Meeting>, StoreError> {
        self.blocking(move |conn| queries::get_meeting(conn, id)).await
    }

    async fn list_meetings(&self, query: MeetingQuery) -> Result<Vec<Meeting>, StoreError> {
        self.blocking(move |conn| queries::list_meetings(conn, &query)).await
    }

    async fn update_meeting_status(
        &self,
        id: Uuid,
        status: MeetingStatus,
    ) -> Result<Meeting, StoreError> {
        self.blocking(move |conn| queries::update_meeting_status(conn, id, status)).await
    }

    async fn insert_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Message, StoreError> {
        let content = content.to_string();
        let message = self
            .blocking(move |conn| queries::insert_message(conn, sender_id, receiver_id, &content))
            .await?;

        self.feed().publish(StoreEvent::MessageInserted {
            message: message.clone(),
        });

        Ok(message)
    }

    async fn messages_touching(&self, user: Uuid) -> Result<Vec<MessageWithSender>, StoreError> {
        self.blocking(move |conn| queries::messages_touching(conn, user)).await
    }

    async fn mark_conversation_read(
        &self,
        receiver_id: Uuid,
        sender_id: Uuid,
    ) -> Result<usize, StoreError> {
        self.blocking(move |conn| queries::mark_conversation_read(conn, receiver_id, sender_id))
            .await
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.feed().subscribe()
    }
}
