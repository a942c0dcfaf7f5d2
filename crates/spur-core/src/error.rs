use thiserror::Error;

/// Top-level error type for the Spur chat service.
///
/// Subsystem crates define their own error types and convert to or from
/// `SpurError` so that the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpurError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for SpurError {
    fn from(err: toml::de::Error) -> Self {
        SpurError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SpurError {
    fn from(err: toml::ser::Error) -> Self {
        SpurError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SpurError {
    fn from(err: serde_json::Error) -> Self {
        SpurError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Spur operations.
pub type Result<T> = std::result::Result<T, SpurError>;
