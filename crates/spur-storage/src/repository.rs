//! Conversation persistence.
//!
//! `ConversationStore` is the seam the chat core depends on;
//! `ConversationRepository` implements it over the SQLite `Database`
//! using raw SQL.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use spur_core::error::SpurError;
use spur_core::types::{Conversation, Message, Role};

use crate::db::Database;

/// Persistence operations needed by the chat core.
pub trait ConversationStore: Send + Sync {
    /// Create a new conversation with a fresh random id and no messages.
    fn create_conversation(&self) -> Result<Conversation, SpurError>;

    /// Look up a conversation with its messages in transcript order.
    fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>, SpurError>;

    /// Append a message to an existing conversation.
    fn append_message(
        &self,
        conversation_id: Uuid,
        role: Role,
        content: &str,
    ) -> Result<Message, SpurError>;

    /// Number of messages stored for a conversation.
    fn count_messages(&self, conversation_id: Uuid) -> Result<u64, SpurError>;
}

/// SQLite-backed conversation repository.
pub struct ConversationRepository {
    db: Arc<Database>,
}

impl ConversationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl ConversationStore for ConversationRepository {
    fn create_conversation(&self) -> Result<Conversation, SpurError> {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            created_at: now_millis(),
            messages: Vec::new(),
        };

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations (id, created_at) VALUES (?1, ?2)",
                rusqlite::params![
                    conversation.id.to_string(),
                    conversation.created_at.timestamp_millis(),
                ],
            )
            .map_err(|e| SpurError::Storage(format!("Failed to create conversation: {}", e)))?;
            Ok(())
        })?;

        Ok(conversation)
    }

    fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>, SpurError> {
        self.db.with_conn(|conn| {
            let created_at: Option<i64> = conn
                .query_row(
                    "SELECT created_at FROM conversations WHERE id = ?1",
                    rusqlite::params![id.to_string()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| SpurError::Storage(e.to_string()))?;

            let Some(created_at) = created_at else {
                return Ok(None);
            };

            let mut stmt = conn
                .prepare(
                    "SELECT id, conversation_id, role, content, created_at
                     FROM messages
                     WHERE conversation_id = ?1
                     ORDER BY created_at ASC, rowid ASC",
                )
                .map_err(|e| SpurError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![id.to_string()], |row| {
                    Ok(row_to_message(row))
                })
                .map_err(|e| SpurError::Storage(e.to_string()))?;

            let mut messages = Vec::new();
            for row in rows {
                let message = row.map_err(|e| SpurError::Storage(e.to_string()))??;
                messages.push(message);
            }

            Ok(Some(Conversation {
                id,
                created_at: millis_to_datetime(created_at)?,
                messages,
            }))
        })
    }

    fn append_message(
        &self,
        conversation_id: Uuid,
        role: Role,
        content: &str,
    ) -> Result<Message, SpurError> {
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            content: content.to_string(),
            created_at: now_millis(),
        };

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    message.id.to_string(),
                    conversation_id.to_string(),
                    role.as_str(),
                    message.content,
                    message.created_at.timestamp_millis(),
                ],
            )
            .map_err(|e| SpurError::Storage(format!("Failed to save message: {}", e)))?;
            Ok(())
        })?;

        Ok(message)
    }

    fn count_messages(&self, conversation_id: Uuid) -> Result<u64, SpurError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
                    rusqlite::params![conversation_id.to_string()],
                    |row| row.get(0),
                )
                .map_err(|e| SpurError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

// =============================================================================
// Row mapping helpers
// =============================================================================

/// Current time truncated to the millisecond precision the schema stores.
fn now_millis() -> DateTime<Utc> {
    let ms = Utc::now().timestamp_millis();
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>, SpurError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| SpurError::Storage(format!("Invalid timestamp: {}", ms)))
}

fn parse_uuid(raw: &str) -> Result<Uuid, SpurError> {
    Uuid::parse_str(raw).map_err(|e| SpurError::Storage(format!("Invalid UUID '{}': {}", raw, e)))
}

fn row_to_message(row: &rusqlite::Row) -> Result<Message, SpurError> {
    let get_err = |e: rusqlite::Error| SpurError::Storage(e.to_string());

    let id: String = row.get(0).map_err(get_err)?;
    let conversation_id: String = row.get(1).map_err(get_err)?;
    let role: String = row.get(2).map_err(get_err)?;
    let content: String = row.get(3).map_err(get_err)?;
    let created_at: i64 = row.get(4).map_err(get_err)?;

    Ok(Message {
        id: parse_uuid(&id)?,
        conversation_id: parse_uuid(&conversation_id)?,
        role: role.parse()?,
        content,
        created_at: millis_to_datetime(created_at)?,
    })
}
