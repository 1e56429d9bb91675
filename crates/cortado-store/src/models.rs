//! Database row types — these map directly to SQLite rows.
//! Kept separate from the cortado-types domain models; parsing into domain
//! types happens exactly once, at the store boundary.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use cortado_types::models::{Connection, Meeting, Message, UserProfile};

use crate::error::StoreError;

pub struct ProfileRow {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub interests: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ConnectionRow {
    pub id: String,
    pub requester_id: String,
    pub requested_id: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct MeetingRow {
    pub id: String,
    pub organizer_id: String,
    pub attendee_id: String,
    pub scheduled_at: String,
    pub duration_minutes: u32,
    pub note: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub read: bool,
    pub created_at: String,
}

/// Fixed-width UTC text form. Lexicographic order on the column matches
/// chronological order, which the ORDER BY clauses rely on.
pub fn ts_to_sql(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_ts(entity: &'static str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| {
            // Rows written by external tooling may carry SQLite's bare
            // "YYYY-MM-DD HH:MM:SS" form; treat it as UTC.
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
                .map_err(|e| StoreError::corrupt(entity, format!("timestamp '{value}': {e}")))
        })
}

pub fn parse_id(entity: &'static str, value: &str) -> Result<Uuid, StoreError> {
    value
        .parse()
        .map_err(|e| StoreError::corrupt(entity, format!("id '{value}': {e}")))
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(UserProfile {
            id: parse_id("profile", &row.id)?,
            email: row.email,
            full_name: row.full_name,
            title: row.title,
            company: row.company,
            industry: row.industry,
            bio: row.bio,
            location: row.location,
            interests: row.interests,
            status: row
                .status
                .parse()
                .map_err(|e| StoreError::corrupt("profile", e))?,
            created_at: parse_ts("profile", &row.created_at)?,
            updated_at: parse_ts("profile", &row.updated_at)?,
        })
    }
}

impl TryFrom<ConnectionRow> for Connection {
    type Error = StoreError;

    fn try_from(row: ConnectionRow) -> Result<Self, Self::Error> {
        Ok(Connection {
            id: parse_id("connection", &row.id)?,
            requester_id: parse_id("connection", &row.requester_id)?,
            requested_id: parse_id("connection", &row.requested_id)?,
            status: row
                .status
                .parse()
                .map_err(|e| StoreError::corrupt("connection", e))?,
            created_at: parse_ts("connection", &row.created_at)?,
            updated_at: parse_ts("connection", &row.updated_at)?,
        })
    }
}

impl TryFrom<MeetingRow> for Meeting {
    type Error = StoreError;

    fn try_from(row: MeetingRow) -> Result<Self, Self::Error> {
        Ok(Meeting {
            id: parse_id("meeting", &row.id)?,
            organizer_id: parse_id("meeting", &row.organizer_id)?,
            attendee_id: parse_id("meeting", &row.attendee_id)?,
            scheduled_at: parse_ts("meeting", &row.scheduled_at)?,
            duration_minutes: row.duration_minutes,
            note: row.note,
            status: row
                .status
                .parse()
                .map_err(|e| StoreError::corrupt("meeting", e))?,
            created_at: parse_ts("meeting", &row.created_at)?,
            updated_at: parse_ts("meeting", &row.updated_at)?,
        })
    }
}

impl TryFrom<MessageRow> for Message {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Message {
            id: parse_id("message", &row.id)?,
            sender_id: parse_id("message", &row.sender_id)?,
            receiver_id: parse_id("message", &row.receiver_id)?,
            content: row.content,
            read: row.read,
            created_at: parse_ts("message", &row.created_at)?,
        })
    }
}
