//! Database schema migrations.
//!
//! Applies the initial schema: conversations, messages, and the
//! schema_migrations bookkeeping table.

use rusqlite::Connection;
use tracing::info;

use spur_core::error::SpurError;

/// Run all pending database migrations.
///
/// Future migrations can be added by checking the current version and
/// applying incremental changes.
pub fn run_migrations(conn: &Connection) -> Result<(), SpurError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| SpurError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| SpurError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: conversations and their messages.
fn apply_v1(conn: &Connection) -> Result<(), SpurError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS conversations (
            id              TEXT PRIMARY KEY NOT NULL,
            created_at      INTEGER NOT NULL
        );

        -- Timestamps are unix milliseconds; rowid breaks same-millisecond ties.
        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY NOT NULL,
            conversation_id TEXT NOT NULL,
            role            TEXT NOT NULL
                            CHECK (role IN ('user', 'assistant')),
            content         TEXT NOT NULL CHECK (length(content) > 0),
            created_at      INTEGER NOT NULL,
            FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages (conversation_id, created_at ASC);

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| SpurError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}
