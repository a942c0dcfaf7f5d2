pub mod config;
pub mod error;
pub mod types;

pub use config::SpurConfig;
pub use error::{Result, SpurError};
pub use types::*;
