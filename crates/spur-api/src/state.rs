//! Application state shared across all route handlers.
//!
//! AppState holds the chat components, each built once at startup from
//! explicitly injected collaborators. It is passed to handlers via axum's
//! State extractor.

use std::sync::Arc;
use std::time::Instant;

use spur_chat::{HistoryReader, ReplyGenerator, ReplyOrchestrator, SessionResolver};
use spur_core::config::SpurConfig;
use spur_storage::ConversationStore;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<SpurConfig>,
    /// Maps client session ids to conversations.
    pub resolver: Arc<SessionResolver>,
    /// Runs chat turns.
    pub orchestrator: Arc<ReplyOrchestrator>,
    /// Reads full transcripts.
    pub history: Arc<HistoryReader>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Wire the chat components around a store and a reply generator.
    pub fn new(
        config: SpurConfig,
        store: Arc<dyn ConversationStore>,
        generator: Arc<dyn ReplyGenerator>,
    ) -> Self {
        let orchestrator = ReplyOrchestrator::new(Arc::clone(&store), generator)
            .with_context_window(config.chat.context_window);

        Self {
            resolver: Arc::new(SessionResolver::new(Arc::clone(&store))),
            orchestrator: Arc::new(orchestrator),
            history: Arc::new(HistoryReader::new(store)),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }
}
