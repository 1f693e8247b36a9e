//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order. A
//! `schema_migrations` table tracks which versions have been applied.

use eventimg_common::{Error, Result};
use rusqlite::Connection;

/// V1: events and their images.
const V1_INITIAL: &str = r#"
CREATE TABLE events (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    title      TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE event_images (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id      INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    file_path     TEXT NOT NULL,
    mime_type     TEXT NOT NULL,
    file_name     TEXT NOT NULL,
    file_size     INTEGER NOT NULL CHECK (file_size >= 0),
    width         INTEGER NOT NULL CHECK (width > 0),
    height        INTEGER NOT NULL CHECK (height > 0),
    image_quality TEXT NOT NULL CHECK (image_quality IN ('original', 'compressed', 'thumbnail')),
    sort_order    INTEGER NOT NULL DEFAULT 0,
    is_primary    INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE INDEX idx_event_images_order ON event_images(event_id, sort_order, id);
CREATE INDEX idx_event_images_path ON event_images(file_path);
"#;

const MIGRATIONS: &[(i64, &str)] = &[(1, V1_INITIAL)];

/// Run all pending migrations on `conn`.
///
/// Creates the `schema_migrations` tracking table if it does not exist,
/// then applies each outstanding migration inside a transaction. Returns the
/// number of migrations applied.
pub fn run_migrations(conn: &Connection) -> Result<usize> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))?;

    let mut applied = 0;
    for &(version, sql) in MIGRATIONS {
        let already: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(Error::database)?;

        if already {
            continue;
        }

        let tx = conn.unchecked_transaction().map_err(Error::database)?;

        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("Migration V{version} failed: {e}")))?;

        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )
        .map_err(Error::database)?;

        tx.commit().map_err(Error::database)?;

        tracing::debug!(version, "applied schema migration");
        applied += 1;
    }

    Ok(applied)
}

/// Latest schema version known to this build.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|&(v, _)| v).unwrap_or(0)
}
