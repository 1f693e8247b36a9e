//! Event rows.
//!
//! Event management belongs to another service; these helpers exist so the
//! image tables have something to reference in development and tests.

use chrono::Utc;
use eventimg_common::{Error, EventId, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::models::Event;

/// Create a new event.
pub fn create_event(conn: &Connection, title: &str) -> Result<Event> {
    if title.trim().is_empty() {
        return Err(Error::validation("event title cannot be empty"));
    }

    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO events (title, created_at) VALUES (?1, ?2)",
        rusqlite::params![title, created_at.to_rfc3339()],
    )
    .map_err(Error::database)?;

    Ok(Event {
        id: EventId::new(conn.last_insert_rowid())?,
        title: title.to_string(),
        created_at,
    })
}

/// Get an event by ID.
pub fn get_event(conn: &Connection, id: EventId) -> Result<Option<Event>> {
    conn.query_row(
        "SELECT id, title, created_at FROM events WHERE id = ?1",
        [id.get()],
        Event::from_row,
    )
    .optional()
    .map_err(Error::database)
}

/// Whether an event with this ID exists.
pub fn event_exists(conn: &Connection, id: EventId) -> Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM events WHERE id = ?1",
        [id.get()],
        |row| row.get(0),
    )
    .map_err(Error::database)
}
