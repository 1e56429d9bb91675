use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ConnectionStatus, MeetingStatus};

// -- Profiles --

/// Fields the owner supplies when a profile is first created; id, presence
/// and timestamps are assigned by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProfile {
    pub email: String,
    pub full_name: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub interests: Option<String>,
}

/// Profile edit form payload. `Some` fields are written, `None` fields are
/// left untouched. Clearing a field means sending `Some("")`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub interests: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.title.is_none()
            && self.company.is_none()
            && self.industry.is_none()
            && self.bio.is_none()
            && self.location.is_none()
            && self.interests.is_none()
    }
}

/// Directory listing: everyone but `exclude`, optionally one industry,
/// ordered by last profile update (most recent first).
#[derive(Debug, Clone)]
pub struct ProfileQuery {
    pub exclude: Option<Uuid>,
    pub industry: Option<String>,
}

// -- Connections --

#[derive(Debug, Clone, Default)]
pub struct ConnectionQuery {
    pub requester: Option<Uuid>,
    pub requested: Option<Uuid>,
    /// Either endpoint matches (OR of the two equality clauses).
    pub involving: Option<Uuid>,
    pub status: Option<ConnectionStatus>,
}

// -- Meetings --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMeeting {
    pub organizer_id: Uuid,
    pub attendee_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub note: Option<String>,
}

/// Meetings for a participant (organizer or attendee), optionally bounded
/// below by scheduled time, ordered by scheduled time ascending.
#[derive(Debug, Clone)]
pub struct MeetingQuery {
    pub participant: Uuid,
    pub scheduled_after: Option<DateTime<Utc>>,
    pub status: Option<MeetingStatus>,
}
