//! Spur storage crate - SQLite persistence for conversations and messages.
//!
//! Provides a WAL-mode SQLite database with migrations, the
//! `ConversationStore` persistence seam, and its SQLite implementation.

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::{ConversationRepository, ConversationStore};
