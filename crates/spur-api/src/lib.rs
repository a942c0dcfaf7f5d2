//! Spur API crate - axum HTTP server and route handlers.
//!
//! Exposes the chat endpoints (`POST /chat/message`,
//! `GET /chat/history/{sessionId}`), a health check, and in production
//! mode the built front-end.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod validation;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
