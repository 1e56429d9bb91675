use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A status string the store handed back that none of the enums recognize.
#[derive(Debug, Clone, Error)]
#[error("unrecognized {kind} status '{value}'")]
pub struct InvalidStatus {
    pub kind: &'static str,
    pub value: String,
}

/// User-chosen availability flag, independent of network connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Available,
    Busy,
    Offline,
}

impl PresenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Busy => "busy",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresenceStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "busy" => Ok(Self::Busy),
            "offline" => Ok(Self::Offline),
            other => Err(InvalidStatus {
                kind: "presence",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Accepted and rejected are terminal; no further transitions exist.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(InvalidStatus {
                kind: "connection",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl MeetingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(InvalidStatus {
                kind: "meeting",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub interests: Option<String>,
    pub status: PresenceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Stand-in profile for a counterparty the store could not resolve.
    /// Rendered with empty fields rather than failing the whole view.
    pub fn placeholder(id: Uuid) -> Self {
        Self {
            id,
            email: String::new(),
            full_name: String::new(),
            title: None,
            company: None,
            industry: None,
            bio: None,
            location: None,
            interests: None,
            status: PresenceStatus::Offline,
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        }
    }
}

/// Directed connection request: requester -> requested.
/// Only the requested party transitions the status, exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub requested_id: Uuid,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.requester_id == user_id || self.requested_id == user_id
    }

    /// The other endpoint of the edge, if `user_id` is on it at all.
    pub fn counterparty(&self, user_id: Uuid) -> Option<Uuid> {
        if self.requester_id == user_id {
            Some(self.requested_id)
        } else if self.requested_id == user_id {
            Some(self.requester_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub attendee_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub note: Option<String>,
    pub status: MeetingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.organizer_id == user_id || self.attendee_id == user_id
    }

    /// Local reminders fire 15 minutes before the scheduled time.
    pub fn reminder_at(&self) -> DateTime<Utc> {
        self.scheduled_at - chrono::Duration::minutes(15)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// The endpoint that is not `user_id`. `None` means the message does not
    /// touch that user at all — malformed input for the aggregation pipeline.
    pub fn counterparty(&self, user_id: Uuid) -> Option<Uuid> {
        if self.sender_id == user_id {
            Some(self.receiver_id)
        } else if self.receiver_id == user_id {
            Some(self.sender_id)
        } else {
            None
        }
    }
}

/// A fetched message with the sender's profile expanded, when the store had it.
/// The expansion is absent when the current user is the sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageWithSender {
    pub message: Message,
    pub sender: Option<UserProfile>,
}

/// Derived per-counterparty summary. A view over a message snapshot — recomputed
/// on every fetch, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub counterparty: UserProfile,
    pub last_message: Option<Message>,
    pub unread_count: usize,
}

impl Conversation {
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message.as_ref().map(|m| m.created_at)
    }
}
