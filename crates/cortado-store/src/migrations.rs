use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS profiles (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            full_name   TEXT NOT NULL,
            title       TEXT,
            company     TEXT,
            industry    TEXT,
            bio         TEXT,
            location    TEXT,
            interests   TEXT,
            status      TEXT NOT NULL DEFAULT 'offline',
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_profiles_industry
            ON profiles(industry, updated_at);

        CREATE TABLE IF NOT EXISTS connections (
            id              TEXT PRIMARY KEY,
            requester_id    TEXT NOT NULL REFERENCES profiles(id),
            requested_id    TEXT NOT NULL REFERENCES profiles(id),
            status          TEXT NOT NULL DEFAULT 'pending',
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_connections_requested
            ON connections(requested_id, status);
        CREATE INDEX IF NOT EXISTS idx_connections_requester
            ON connections(requester_id, status);

        CREATE TABLE IF NOT EXISTS meetings (
            id                  TEXT PRIMARY KEY,
            organizer_id        TEXT NOT NULL REFERENCES profiles(id),
            attendee_id         TEXT NOT NULL REFERENCES profiles(id),
            scheduled_at        TEXT NOT NULL,
            duration_minutes    INTEGER NOT NULL,
            note                TEXT,
            status              TEXT NOT NULL DEFAULT 'pending',
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_meetings_organizer
            ON meetings(organizer_id, scheduled_at);
        CREATE INDEX IF NOT EXISTS idx_meetings_attendee
            ON meetings(attendee_id, scheduled_at);

        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            sender_id   TEXT NOT NULL REFERENCES profiles(id),
            receiver_id TEXT NOT NULL REFERENCES profiles(id),
            content     TEXT NOT NULL,
            read        INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_sender
            ON messages(sender_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_messages_receiver
            ON messages(receiver_id, read);
        ",
    )?;

    info!("store migrations complete");
    Ok(())
}
