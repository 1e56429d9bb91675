use chrono::Utc;
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use cortado_types::api::{ConnectionQuery, MeetingQuery, NewMeeting, NewProfile, ProfilePatch, ProfileQuery};
use cortado_types::models::{
    Connection as ConnectionEdge, ConnectionStatus, Meeting, MeetingStatus, Message,
    MessageWithSender, PresenceStatus, UserProfile,
};

use crate::error::StoreError;
use crate::models::{
    ConnectionRow, MeetingRow, MessageRow, ProfileRow, ts_to_sql,
};

const PROFILE_COLS: &str =
    "id, email, full_name, title, company, industry, bio, location, interests, status, created_at, updated_at";

// -- Profiles --

pub fn create_profile(conn: &Connection, new: &NewProfile) -> Result<UserProfile, StoreError> {
    let now = Utc::now();
    let profile = UserProfile {
        id: Uuid::new_v4(),
        email: new.email.clone(),
        full_name: new.full_name.clone(),
        title: new.title.clone(),
        company: new.company.clone(),
        industry: new.industry.clone(),
        bio: new.bio.clone(),
        location: new.location.clone(),
        interests: new.interests.clone(),
        status: PresenceStatus::Offline,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO profiles (id, email, full_name, title, company, industry, bio, location, interests, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        rusqlite::params![
            profile.id.to_string(),
            profile.email,
            profile.full_name,
            profile.title,
            profile.company,
            profile.industry,
            profile.bio,
            profile.location,
            profile.interests,
            profile.status.as_str(),
            ts_to_sql(profile.created_at),
            ts_to_sql(profile.updated_at),
        ],
    )?;

    Ok(profile)
}

pub fn get_profile(conn: &Connection, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
    let sql = format!("SELECT {PROFILE_COLS} FROM profiles WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt
        .query_row([id.to_string()], map_profile_row)
        .optional()?;
    row.map(UserProfile::try_from).transpose()
}

pub fn get_profile_by_email(conn: &Connection, email: &str) -> Result<Option<UserProfile>, StoreError> {
    let sql = format!("SELECT {PROFILE_COLS} FROM profiles WHERE email = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([email], map_profile_row).optional()?;
    row.map(UserProfile::try_from).transpose()
}

pub fn list_profiles(conn: &Connection, query: &ProfileQuery) -> Result<Vec<UserProfile>, StoreError> {
    let mut sql = format!("SELECT {PROFILE_COLS} FROM profiles");
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<&dyn ToSql> = Vec::new();

    let exclude = query.exclude.map(|id| id.to_string());
    if let Some(ref id) = exclude {
        clauses.push(format!("id != ?{}", params.len() + 1));
        params.push(id);
    }
    if let Some(ref industry) = query.industry {
        clauses.push(format!("industry = ?{}", params.len() + 1));
        params.push(industry);
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY updated_at DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params.as_slice(), map_profile_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(UserProfile::try_from).collect()
}

/// Batch-fetch profiles for a set of ids. Ids with no matching row are simply
/// absent from the result.
pub fn profiles_by_ids(conn: &Connection, ids: &[Uuid]) -> Result<Vec<UserProfile>, StoreError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT {PROFILE_COLS} FROM profiles WHERE id IN ({})",
        placeholders.join(", ")
    );

    let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    let params: Vec<&dyn ToSql> = id_strings.iter().map(|s| s as &dyn ToSql).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params.as_slice(), map_profile_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(UserProfile::try_from).collect()
}

pub fn update_profile(
    conn: &Connection,
    id: Uuid,
    patch: &ProfilePatch,
) -> Result<UserProfile, StoreError> {
    let mut sets: Vec<String> = Vec::new();
    let mut params: Vec<&dyn ToSql> = Vec::new();

    let fields: [(&str, &Option<String>); 7] = [
        ("full_name", &patch.full_name),
        ("title", &patch.title),
        ("company", &patch.company),
        ("industry", &patch.industry),
        ("bio", &patch.bio),
        ("location", &patch.location),
        ("interests", &patch.interests),
    ];
    for (column, value) in fields {
        if let Some(v) = value {
            sets.push(format!("{column} = ?{}", params.len() + 1));
            params.push(v);
        }
    }

    let now = ts_to_sql(Utc::now());
    sets.push(format!("updated_at = ?{}", params.len() + 1));
    params.push(&now);

    let id_string = id.to_string();
    let sql = format!(
        "UPDATE profiles SET {} WHERE id = ?{}",
        sets.join(", "),
        params.len() + 1
    );
    params.push(&id_string);

    let changed = conn.execute(&sql, params.as_slice())?;
    if changed == 0 {
        return Err(StoreError::NotFound { entity: "profile", id });
    }

    get_profile(conn, id)?.ok_or(StoreError::NotFound { entity: "profile", id })
}

pub fn set_presence(conn: &Connection, id: Uuid, status: PresenceStatus) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE profiles SET status = ?1, updated_at = ?2 WHERE id = ?3",
        rusqlite::params![status.as_str(), ts_to_sql(Utc::now()), id.to_string()],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound { entity: "profile", id });
    }
    Ok(())
}

// -- Connections --

pub fn insert_connection(
    conn: &Connection,
    requester_id: Uuid,
    requested_id: Uuid,
) -> Result<ConnectionEdge, StoreError> {
    let now = Utc::now();
    let edge = ConnectionEdge {
        id: Uuid::new_v4(),
        requester_id,
        requested_id,
        status: ConnectionStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO connections (id, requester_id, requested_id, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            edge.id.to_string(),
            edge.requester_id.to_string(),
            edge.requested_id.to_string(),
            edge.status.as_str(),
            ts_to_sql(edge.created_at),
            ts_to_sql(edge.updated_at),
        ],
    )?;

    Ok(edge)
}

pub fn get_connection(conn: &Connection, id: Uuid) -> Result<Option<ConnectionEdge>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, requester_id, requested_id, status, created_at, updated_at
         FROM connections WHERE id = ?1",
    )?;
    let row = stmt
        .query_row([id.to_string()], map_connection_row)
        .optional()?;
    row.map(ConnectionEdge::try_from).transpose()
}

pub fn list_connections(
    conn: &Connection,
    query: &ConnectionQuery,
) -> Result<Vec<ConnectionEdge>, StoreError> {
    let mut sql = String::from(
        "SELECT id, requester_id, requested_id, status, created_at, updated_at FROM connections",
    );
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<&dyn ToSql> = Vec::new();

    let requester = query.requester.map(|u| u.to_string());
    let requested = query.requested.map(|u| u.to_string());
    let involving = query.involving.map(|u| u.to_string());
    let status = query.status.map(|s| s.as_str().to_string());

    if let Some(ref v) = requester {
        clauses.push(format!("requester_id = ?{}", params.len() + 1));
        params.push(v);
    }
    if let Some(ref v) = requested {
        clauses.push(format!("requested_id = ?{}", params.len() + 1));
        params.push(v);
    }
    if let Some(ref v) = involving {
        let n = params.len() + 1;
        clauses.push(format!("(requester_id = ?{n} OR requested_id = ?{n})"));
        params.push(v);
    }
    if let Some(ref v) = status {
        clauses.push(format!("status = ?{}", params.len() + 1));
        params.push(v);
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params.as_slice(), map_connection_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(ConnectionEdge::try_from).collect()
}

pub fn update_connection_status(
    conn: &Connection,
    id: Uuid,
    status: ConnectionStatus,
) -> Result<ConnectionEdge, StoreError> {
    let changed = conn.execute(
        "UPDATE connections SET status = ?1, updated_at = ?2 WHERE id = ?3",
        rusqlite::params![status.as_str(), ts_to_sql(Utc::now()), id.to_string()],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound { entity: "connection", id });
    }
    get_connection(conn, id)?.ok_or(StoreError::NotFound { entity: "connection", id })
}

// -- Meetings --

pub fn insert_meeting(conn: &Connection, new: &NewMeeting) -> Result<Meeting, StoreError> {
    let now = Utc::now();
    let meeting = Meeting {
        id: Uuid::new_v4(),
        organizer_id: new.organizer_id,
        attendee_id: new.attendee_id,
        scheduled_at: new.scheduled_at,
        duration_minutes: new.duration_minutes,
        note: new.note.clone(),
        status: MeetingStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO meetings (id, organizer_id, attendee_id, scheduled_at, duration_minutes, note, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            meeting.id.to_string(),
            meeting.organizer_id.to_string(),
            meeting.attendee_id.to_string(),
            ts_to_sql(meeting.scheduled_at),
            meeting.duration_minutes,
            meeting.note,
            meeting.status.as_str(),
            ts_to_sql(meeting.created_at),
            ts_to_sql(meeting.updated_at),
        ],
    )?;

    Ok(meeting)
}

pub fn get_meeting(conn: &Connection, id: Uuid) -> Result<Option<Meeting>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, organizer_id, attendee_id, scheduled_at, duration_minutes, note, status, created_at, updated_at
         FROM meetings WHERE id = ?1",
    )?;
    let row = stmt
        .query_row([id.to_string()], map_meeting_row)
        .optional()?;
    row.map(Meeting::try_from).transpose()
}

pub fn list_meetings(conn: &Connection, query: &MeetingQuery) -> Result<Vec<Meeting>, StoreError> {
    let mut sql = String::from(
        "SELECT id, organizer_id, attendee_id, scheduled_at, duration_minutes, note, status, created_at, updated_at
         FROM meetings",
    );
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<&dyn ToSql> = Vec::new();

    let participant = query.participant.to_string();
    let n = params.len() + 1;
    clauses.push(format!("(organizer_id = ?{n} OR attendee_id = ?{n})"));
    params.push(&participant);

    let after = query.scheduled_after.map(ts_to_sql);
    if let Some(ref v) = after {
        clauses.push(format!("scheduled_at >= ?{}", params.len() + 1));
        params.push(v);
    }
    let status = query.status.map(|s| s.as_str().to_string());
    if let Some(ref v) = status {
        clauses.push(format!("status = ?{}", params.len() + 1));
        params.push(v);
    }

    sql.push_str(" WHERE ");
    sql.push_str(&clauses.join(" AND "));
    sql.push_str(" ORDER BY scheduled_at ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params.as_slice(), map_meeting_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(Meeting::try_from).collect()
}

pub fn update_meeting_status(
    conn: &Connection,
    id: Uuid,
    status: MeetingStatus,
) -> Result<Meeting, StoreError> {
    let changed = conn.execute(
        "UPDATE meetings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        rusqlite::params![status.as_str(), ts_to_sql(Utc::now()), id.to_string()],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound { entity: "meeting", id });
    }
    get_meeting(conn, id)?.ok_or(StoreError::NotFound { entity: "meeting", id })
}

// -- Messages --

pub fn insert_message(
    conn: &Connection,
    sender_id: Uuid,
    receiver_id: Uuid,
    content: &str,
) -> Result<Message, StoreError> {
    let message = Message {
        id: Uuid::new_v4(),
        sender_id,
        receiver_id,
        content: content.to_string(),
        read: false,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO messages (id, sender_id, receiver_id, content, read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            message.id.to_string(),
            message.sender_id.to_string(),
            message.receiver_id.to_string(),
            message.content,
            message.read,
            ts_to_sql(message.created_at),
        ],
    )?;

    Ok(message)
}

/// All messages touching `user`, newest first, with the sender's profile
/// expanded via the join. The expansion is dropped for messages the user sent
/// themselves — the caller only ever needs counterparty profiles.
pub fn messages_touching(conn: &Connection, user: Uuid) -> Result<Vec<MessageWithSender>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.sender_id, m.receiver_id, m.content, m.read, m.created_at,
                p.id, p.email, p.full_name, p.title, p.company, p.industry,
                p.bio, p.location, p.interests, p.status, p.created_at, p.updated_at
         FROM messages m
         LEFT JOIN profiles p ON p.id = m.sender_id
         WHERE m.sender_id = ?1 OR m.receiver_id = ?1
         ORDER BY m.created_at DESC",
    )?;

    let rows = stmt
        .query_map([user.to_string()], |row| {
            let message = MessageRow {
                id: row.get(0)?,
                sender_id: row.get(1)?,
                receiver_id: row.get(2)?,
                content: row.get(3)?,
                read: row.get(4)?,
                created_at: row.get(5)?,
            };
            let sender = match row.get::<_, Option<String>>(6)? {
                Some(id) => Some(ProfileRow {
                    id,
                    email: row.get(7)?,
                    full_name: row.get(8)?,
                    title: row.get(9)?,
                    company: row.get(10)?,
                    industry: row.get(11)?,
                    bio: row.get(12)?,
                    location: row.get(13)?,
                    interests: row.get(14)?,
                    status: row.get(15)?,
                    created_at: row.get(16)?,
                    updated_at: row.get(17)?,
                }),
                None => None,
            };
            Ok((message, sender))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(rows.len());
    for (message_row, sender_row) in rows {
        let message = Message::try_from(message_row)?;
        let sender = if message.sender_id == user {
            None
        } else {
            sender_row.map(UserProfile::try_from).transpose()?
        };
        out.push(MessageWithSender { message, sender });
    }
    Ok(out)
}

/// Flag every unread message from `sender` to `receiver` as read.
/// Returns how many rows changed.
pub fn mark_conversation_read(
    conn: &Connection,
    receiver_id: Uuid,
    sender_id: Uuid,
) -> Result<usize, StoreError> {
    let changed = conn.execute(
        "UPDATE messages SET read = 1 WHERE receiver_id = ?1 AND sender_id = ?2 AND read = 0",
        rusqlite::params![receiver_id.to_string(), sender_id.to_string()],
    )?;
    Ok(changed)
}

// -- Row mapping --

fn map_profile_row(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        title: row.get(3)?,
        company: row.get(4)?,
        industry: row.get(5)?,
        bio: row.get(6)?,
        location: row.get(7)?,
        interests: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn map_connection_row(row: &Row<'_>) -> rusqlite::Result<ConnectionRow> {
    Ok(ConnectionRow {
        id: row.get(0)?,
        requester_id: row.get(1)?,
        requested_id: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn map_meeting_row(row: &Row<'_>) -> rusqlite::Result<MeetingRow> {
    Ok(MeetingRow {
        id: row.get(0)?,
        organizer_id: row.get(1)?,
        attendee_id: row.get(2)?,
        scheduled_at: row.get(3)?,
        duration_minutes: row.get(4)?,
        note: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
