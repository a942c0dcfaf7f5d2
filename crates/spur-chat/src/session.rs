//! Session resolution: map a client-supplied session id to a conversation.

use std::sync::Arc;

use uuid::Uuid;

use spur_core::types::Conversation;
use spur_storage::ConversationStore;

use crate::error::ChatError;

/// Resolves the conversation a chat turn operates on.
///
/// A missing, unknown, or unparseable session id starts a fresh
/// conversation instead of failing; callers detect rotation by comparing
/// the returned id with the one they sent.
pub struct SessionResolver {
    store: Arc<dyn ConversationStore>,
}

impl SessionResolver {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Return the requested conversation with its transcript, or a new
    /// empty one.
    pub fn resolve(&self, requested: Option<&str>) -> Result<Conversation, ChatError> {
        if let Some(raw) = requested {
            match Uuid::parse_str(raw) {
                Ok(id) => {
                    if let Some(conversation) = self.store.find_conversation(id)? {
                        tracing::debug!(
                            session_id = %id,
                            prior_messages = conversation.messages.len(),
                            "Resumed conversation"
                        );
                        return Ok(conversation);
                    }
                    tracing::info!(session_id = %id, "Unknown session, starting a new one");
                }
                Err(_) => {
                    tracing::info!(session_id = %raw, "Unparseable session id, starting a new one");
                }
            }
        }

        let conversation = self.store.create_conversation()?;
        tracing::info!(session_id = %conversation.id, "Created conversation");
        Ok(conversation)
    }
}
