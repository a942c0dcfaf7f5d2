//! Read-only transcript retrieval.

use std::sync::Arc;

use uuid::Uuid;

use spur_core::types::Message;
use spur_storage::ConversationStore;

use crate::error::ChatError;

/// Fetches the full, unwindowed transcript of a session.
pub struct HistoryReader {
    store: Arc<dyn ConversationStore>,
}

impl HistoryReader {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// All messages of the session in transcript order.
    ///
    /// An id that is not a UUID cannot name a stored conversation and is
    /// reported as `SessionNotFound`, same as an unknown one.
    pub fn get_history(&self, session_id: &str) -> Result<Vec<Message>, ChatError> {
        let not_found = || ChatError::SessionNotFound(session_id.to_string());

        let id = Uuid::parse_str(session_id).map_err(|_| not_found())?;
        let conversation = self.store.find_conversation(id)?.ok_or_else(not_found)?;
        Ok(conversation.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spur_core::types::Role;
    use spur_storage::{ConversationRepository, Database};

    fn make_store() -> Arc<ConversationRepository> {
        Arc::new(ConversationRepository::new(Arc::new(
            Database::in_memory().unwrap(),
        )))
    }

    #[test]
    fn test_history_returns_all_messages_in_order() {
        let store = make_store();
        let conv = store.create_conversation().unwrap();
        for i in 0..30 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            store.append_message(conv.id, role, &format!("m{}", i)).unwrap();
        }

        let reader = HistoryReader::new(store);
        let messages = reader.get_history(&conv.session_id()).unwrap();
        assert_eq!(messages.len(), 30);
        assert_eq!(messages[0].content, "m0");
        assert_eq!(messages[29].content, "m29");
    }

    #[test]
    fn test_history_is_idempotent() {
        let store = make_store();
        let conv = store.create_conversation().unwrap();
        store.append_message(conv.id, Role::User, "hi").unwrap();
        store.append_message(conv.id, Role::Assistant, "hello").unwrap();

        let reader = HistoryReader::new(store);
        let first = reader.get_history(&conv.session_id()).unwrap();
        let second = reader.get_history(&conv.session_id()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_history_of_empty_conversation() {
        let store = make_store();
        let conv = store.create_conversation().unwrap();
        let reader = HistoryReader::new(store);
        assert!(reader.get_history(&conv.session_id()).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_session_not_found() {
        let reader = HistoryReader::new(make_store());
        let id = Uuid::new_v4().to_string();
        match reader.get_history(&id) {
            Err(ChatError::SessionNotFound(s)) => assert_eq!(s, id),
            other => panic!("Expected SessionNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_non_uuid_session_not_found() {
        let reader = HistoryReader::new(make_store());
        assert!(matches!(
            reader.get_history("abc"),
            Err(ChatError::SessionNotFound(_))
        ));
    }
}
