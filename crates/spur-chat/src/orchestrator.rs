//! Reply orchestration: one chat turn from user message to stored reply.
//!
//! Persists the user message first, builds a bounded context window from
//! the prior transcript, asks the reply generator for a completion, maps
//! the outcome to customer-facing text, and persists the reply.

use std::sync::Arc;

use spur_core::types::{ChatTurn, Conversation, Message, Role};
use spur_storage::ConversationStore;

use crate::error::ChatError;
use crate::generator::{ReplyGenerator, ReplyOutcome};
use crate::prompt::SYSTEM_PROMPT;

/// Prior messages sent to the model per turn.
pub const DEFAULT_CONTEXT_WINDOW: usize = 10;

/// Stored reply when no provider credentials are configured.
pub const REPLY_MISSING_KEY: &str =
    "I'm sorry, I am currently offline configuration wise (Missing API Key). Please try again later.";

/// Stored reply when the provider call fails.
pub const REPLY_PROVIDER_ERROR: &str =
    "I'm having trouble connecting to my brain right now. Please try again in a moment.";

/// Stored reply when the provider returns no text.
pub const REPLY_EMPTY: &str = "I didn't catch that. Could you rephrase?";

/// What a completed turn hands back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub reply: String,
    pub session_id: String,
}

/// Coordinates persistence and reply generation for a single turn.
pub struct ReplyOrchestrator {
    store: Arc<dyn ConversationStore>,
    generator: Arc<dyn ReplyGenerator>,
    context_window: usize,
    system_prompt: String,
}

impl ReplyOrchestrator {
    /// Create an orchestrator with the default window and store persona.
    pub fn new(store: Arc<dyn ConversationStore>, generator: Arc<dyn ReplyGenerator>) -> Self {
        Self {
            store,
            generator,
            context_window: DEFAULT_CONTEXT_WINDOW,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    /// Override the number of prior messages sent as context.
    pub fn with_context_window(mut self, context_window: usize) -> Self {
        self.context_window = context_window;
        self
    }

    /// Override the system instruction.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Run one turn against an already resolved conversation.
    ///
    /// `conversation.messages` must be the transcript as loaded before this
    /// turn; it is the source of the context window.
    ///
    /// Storage failures propagate without rollback: a stored user message
    /// with no reply is an accepted outcome.
    pub async fn handle_turn(
        &self,
        conversation: &Conversation,
        user_text: &str,
    ) -> Result<TurnReply, ChatError> {
        if user_text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        self.store
            .append_message(conversation.id, Role::User, user_text)?;

        let history = context_window(&conversation.messages, self.context_window);

        let outcome = self
            .generator
            .generate(&self.system_prompt, &history, user_text)
            .await;
        let reply = reply_text(outcome);

        self.store
            .append_message(conversation.id, Role::Assistant, &reply)?;

        tracing::debug!(
            session_id = %conversation.id,
            context_len = history.len(),
            "Turn completed"
        );

        Ok(TurnReply {
            reply,
            session_id: conversation.session_id(),
        })
    }
}

/// The last `window` messages as `{role, content}` pairs, oldest first.
pub fn context_window(messages: &[Message], window: usize) -> Vec<ChatTurn> {
    let start = messages.len().saturating_sub(window);
    messages[start..].iter().map(ChatTurn::from).collect()
}

/// Map a generator outcome to the text stored and shown to the customer.
pub fn reply_text(outcome: ReplyOutcome) -> String {
    match outcome {
        ReplyOutcome::Reply(text) if !text.trim().is_empty() => text,
        ReplyOutcome::Reply(_) => REPLY_EMPTY.to_string(),
        ReplyOutcome::Unavailable => REPLY_MISSING_KEY.to_string(),
        ReplyOutcome::Failed(_) => REPLY_PROVIDER_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use spur_core::error::SpurError;
    use spur_storage::{ConversationRepository, Database};
    use uuid::Uuid;

    /// One recorded `generate` call.
    #[derive(Debug, Clone)]
    struct Call {
        system: String,
        history: Vec<ChatTurn>,
        message: String,
        /// Messages stored for the conversation at the time of the call.
        stored_at_call: Option<u64>,
    }

    struct RecordingGenerator {
        outcome: ReplyOutcome,
        calls: Mutex<Vec<Call>>,
        probe: Option<(Arc<dyn ConversationStore>, Uuid)>,
    }

    impl RecordingGenerator {
        fn new(outcome: ReplyOutcome) -> Self {
            Self {
                outcome,
                calls: Mutex::new(Vec::new()),
                probe: None,
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReplyGenerator for RecordingGenerator {
        async fn generate(
            &self,
            system: &str,
            history: &[ChatTurn],
            message: &str,
        ) -> ReplyOutcome {
            let stored_at_call = self
                .probe
                .as_ref()
                .map(|(store, id)| store.count_messages(*id).unwrap());
            self.calls.lock().unwrap().push(Call {
                system: system.to_string(),
                history: history.to_vec(),
                message: message.to_string(),
                stored_at_call,
            });
            self.outcome.clone()
        }
    }

    /// Store that refuses to persist assistant messages.
    struct NoAssistantStore {
        inner: ConversationRepository,
    }

    impl ConversationStore for NoAssistantStore {
        fn create_conversation(&self) -> Result<Conversation, SpurError> {
            self.inner.create_conversation()
        }

        fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>, SpurError> {
            self.inner.find_conversation(id)
        }

        fn append_message(
            &self,
            conversation_id: Uuid,
            role: Role,
            content: &str,
        ) -> Result<Message, SpurError> {
            if role == Role::Assistant {
                return Err(SpurError::Storage("disk full".to_string()));
            }
            self.inner.append_message(conversation_id, role, content)
        }

        fn count_messages(&self, conversation_id: Uuid) -> Result<u64, SpurError> {
            self.inner.count_messages(conversation_id)
        }
    }

    fn make_store() -> Arc<ConversationRepository> {
        Arc::new(ConversationRepository::new(Arc::new(
            Database::in_memory().unwrap(),
        )))
    }

    fn seed(store: &ConversationRepository, count: usize) -> Conversation {
        let conv = store.create_conversation().unwrap();
        for i in 0..count {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            store
                .append_message(conv.id, role, &format!("prior {}", i))
                .unwrap();
        }
        store.find_conversation(conv.id).unwrap().unwrap()
    }

    fn make_message(i: usize) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id: Uuid::nil(),
            role: if i % 2 == 0 { Role::User } else { Role::Assistant },
            content: format!("m{}", i),
            created_at: Utc::now(),
        }
    }

    // ---- Context window ----

    #[test]
    fn test_context_window_keeps_last_n_in_order() {
        let messages: Vec<_> = (0..15).map(make_message).collect();
        let window = context_window(&messages, 10);
        let contents: Vec<_> = window.iter().map(|t| t.content.as_str()).collect();
        let expected: Vec<String> = (5..15).map(|i| format!("m{}", i)).collect();
        assert_eq!(contents, expected);
    }

    #[test]
    fn test_context_window_shorter_history_is_whole() {
        let messages: Vec<_> = (0..3).map(make_message).collect();
        assert_eq!(context_window(&messages, 10).len(), 3);
        assert!(context_window(&[], 10).is_empty());
    }

    // ---- Outcome mapping ----

    #[test]
    fn test_reply_text_mapping() {
        assert_eq!(reply_text(ReplyOutcome::Reply("Sure!".into())), "Sure!");
        assert_eq!(reply_text(ReplyOutcome::Reply("  \n".into())), REPLY_EMPTY);
        assert_eq!(reply_text(ReplyOutcome::Unavailable), REPLY_MISSING_KEY);
        assert_eq!(
            reply_text(ReplyOutcome::Failed("timeout".into())),
            REPLY_PROVIDER_ERROR
        );
    }

    // ---- Turns ----

    #[tokio::test]
    async fn test_new_conversation_turn_stores_user_then_assistant() {
        let store = make_store();
        let generator = Arc::new(RecordingGenerator::new(ReplyOutcome::Reply(
            "We ship worldwide.".into(),
        )));
        let orch = ReplyOrchestrator::new(store.clone(), generator.clone());
        let conv = store.create_conversation().unwrap();

        let turn = orch.handle_turn(&conv, "Do you ship abroad?").await.unwrap();
        assert_eq!(turn.reply, "We ship worldwide.");
        assert_eq!(turn.session_id, conv.id.to_string());

        let stored = store.find_conversation(conv.id).unwrap().unwrap().messages;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].role, Role::User);
        assert_eq!(stored[0].content, "Do you ship abroad?");
        assert_eq!(stored[1].role, Role::Assistant);
        assert_eq!(stored[1].content, "We ship worldwide.");

        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].history.is_empty());
        assert_eq!(calls[0].message, "Do you ship abroad?");
        assert!(calls[0].system.contains("Spur Store"));
    }

    #[tokio::test]
    async fn test_existing_conversation_appends_two_and_keeps_prefix() {
        let store = make_store();
        let conv = seed(&store, 4);
        let before = conv.messages.clone();
        let generator = Arc::new(RecordingGenerator::new(ReplyOutcome::Reply("ok".into())));
        let orch = ReplyOrchestrator::new(store.clone(), generator);

        orch.handle_turn(&conv, "next question").await.unwrap();

        let after = store.find_conversation(conv.id).unwrap().unwrap().messages;
        assert_eq!(after.len(), before.len() + 2);
        assert_eq!(&after[..before.len()], &before[..]);
    }

    #[tokio::test]
    async fn test_long_history_sends_only_last_ten() {
        let store = make_store();
        let conv = seed(&store, 14);
        let generator = Arc::new(RecordingGenerator::new(ReplyOutcome::Reply("ok".into())));
        let orch = ReplyOrchestrator::new(store.clone(), generator.clone());

        orch.handle_turn(&conv, "latest").await.unwrap();

        let call = &generator.calls()[0];
        assert_eq!(call.history.len(), 10);
        assert_eq!(call.history[0].content, "prior 4");
        assert_eq!(call.history[9].content, "prior 13");
        assert!(call.history.iter().all(|t| t.content != "latest"));
        assert_eq!(call.message, "latest");
    }

    #[tokio::test]
    async fn test_custom_context_window() {
        let store = make_store();
        let conv = seed(&store, 6);
        let generator = Arc::new(RecordingGenerator::new(ReplyOutcome::Reply("ok".into())));
        let orch = ReplyOrchestrator::new(store.clone(), generator.clone())
            .with_context_window(2)
            .with_system_prompt("Be brief.");

        orch.handle_turn(&conv, "hi").await.unwrap();

        let call = &generator.calls()[0];
        assert_eq!(call.system, "Be brief.");
        let contents: Vec<_> = call.history.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["prior 4", "prior 5"]);
    }

    #[tokio::test]
    async fn test_user_message_stored_before_generation() {
        let store = make_store();
        let conv = store.create_conversation().unwrap();
        let generator = Arc::new(RecordingGenerator {
            probe: Some((store.clone() as Arc<dyn ConversationStore>, conv.id)),
            ..RecordingGenerator::new(ReplyOutcome::Reply("ok".into()))
        });
        let orch = ReplyOrchestrator::new(store.clone(), generator.clone());

        orch.handle_turn(&conv, "hello").await.unwrap();

        assert_eq!(generator.calls()[0].stored_at_call, Some(1));
    }

    #[tokio::test]
    async fn test_unavailable_generator_still_completes_turn() {
        let store = make_store();
        let conv = store.create_conversation().unwrap();
        let orch = ReplyOrchestrator::new(
            store.clone(),
            Arc::new(RecordingGenerator::new(ReplyOutcome::Unavailable)),
        );

        let turn = orch.handle_turn(&conv, "hello").await.unwrap();
        assert_eq!(turn.reply, REPLY_MISSING_KEY);

        let stored = store.find_conversation(conv.id).unwrap().unwrap().messages;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].content, REPLY_MISSING_KEY);
    }

    #[tokio::test]
    async fn test_failed_generator_stores_apology() {
        let store = make_store();
        let conv = store.create_conversation().unwrap();
        let orch = ReplyOrchestrator::new(
            store.clone(),
            Arc::new(RecordingGenerator::new(ReplyOutcome::Failed("503".into()))),
        );

        let turn = orch.handle_turn(&conv, "hello").await.unwrap();
        assert_eq!(turn.reply, REPLY_PROVIDER_ERROR);
        assert_eq!(store.count_messages(conv.id).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_message_rejected_without_writes() {
        let store = make_store();
        let conv = store.create_conversation().unwrap();
        let generator = Arc::new(RecordingGenerator::new(ReplyOutcome::Reply("ok".into())));
        let orch = ReplyOrchestrator::new(store.clone(), generator.clone());

        let err = orch.handle_turn(&conv, "").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
        assert_eq!(store.count_messages(conv.id).unwrap(), 0);
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reply_store_failure_keeps_user_message() {
        let inner = ConversationRepository::new(Arc::new(Database::in_memory().unwrap()));
        let conv = inner.create_conversation().unwrap();
        let store = Arc::new(NoAssistantStore { inner });
        let orch = ReplyOrchestrator::new(
            store.clone(),
            Arc::new(RecordingGenerator::new(ReplyOutcome::Reply("ok".into()))),
        );

        let err = orch.handle_turn(&conv, "hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Storage(_)));
        assert_eq!(store.count_messages(conv.id).unwrap(), 1);
    }
}
