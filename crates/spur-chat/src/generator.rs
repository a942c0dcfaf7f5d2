//! The reply generator seam.
//!
//! A generator turns a system instruction, a bounded slice of prior turns,
//! and the new user message into reply text. It never returns an error:
//! failures are reported as `ReplyOutcome` variants and the orchestrator
//! decides what the customer sees.

use async_trait::async_trait;

use spur_core::types::ChatTurn;

/// Result of asking the language model for a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The provider produced a completion (possibly blank).
    Reply(String),
    /// No usable credentials are configured; no request was made.
    Unavailable,
    /// The request failed in transport or at the provider.
    Failed(String),
}

/// Text-in/text-out completion service.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Produce a reply to `message` given the system instruction and the
    /// prior `history` in transcript order.
    async fn generate(&self, system: &str, history: &[ChatTurn], message: &str) -> ReplyOutcome;
}
