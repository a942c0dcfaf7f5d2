//! Conversational core for the Spur support chat.
//!
//! Resolves client sessions to stored conversations, orchestrates a chat
//! turn (persist, build context, generate, persist), and reads back
//! transcripts.

pub mod error;
pub mod generator;
pub mod history;
pub mod openai;
pub mod orchestrator;
pub mod prompt;
pub mod session;

pub use error::ChatError;
pub use generator::{ReplyGenerator, ReplyOutcome};
pub use history::HistoryReader;
pub use openai::OpenAiGenerator;
pub use orchestrator::{ReplyOrchestrator, TurnReply};
pub use session::SessionResolver;
