use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SpurError};

/// Placeholder API key shipped in sample environment files.
pub const API_KEY_PLACEHOLDER: &str = "CHANGE_ME";

/// Top-level configuration for the Spur chat service.
///
/// Loaded from `~/.spur/config.toml` by default, then overridden by
/// environment variables and CLI flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpurConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl SpurConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SpurConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using `lookup` as the variable source.
    ///
    /// Recognised keys: `OPENAI_API_KEY`, `PORT`, `SPUR_MODE`,
    /// `SPUR_DATA_DIR`, `SPUR_LOG`. Unparseable values are skipped.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(port) = lookup("PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!(value = %port, "Ignoring unparseable PORT"),
            }
        }
        if let Some(mode) = lookup("SPUR_MODE") {
            match mode.parse::<RunMode>() {
                Ok(m) => self.server.mode = m,
                Err(e) => warn!(error = %e, "Ignoring SPUR_MODE"),
            }
        }
        if let Some(dir) = lookup("SPUR_DATA_DIR") {
            self.general.data_dir = dir;
        }
        if let Some(level) = lookup("SPUR_LOG") {
            self.general.log_level = level;
        }
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(SpurError::Config("server.port must be non-zero".into()));
        }
        if self.chat.context_window == 0 {
            return Err(SpurError::Config(
                "chat.context_window must be at least 1".into(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(SpurError::Config("llm.max_tokens must be at least 1".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(SpurError::Config(format!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory holding the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.spur/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Whether the process also serves the built front-end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Development,
    Production,
}

impl std::str::FromStr for RunMode {
    type Err = SpurError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(RunMode::Development),
            "production" | "prod" => Ok(RunMode::Production),
            other => Err(SpurError::Config(format!("unknown run mode '{}'", other))),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Listening port.
    pub port: u16,
    /// Development serves a banner at `/`; production serves `public_dir`.
    pub mode: RunMode,
    /// Directory with the built front-end assets.
    pub public_dir: String,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            mode: RunMode::Development,
            public_dir: "public".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

/// Language-model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider API key. Missing keys degrade replies, they never abort startup.
    pub api_key: Option<String>,
    /// Provider base URL (OpenAI-compatible).
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Completion token budget.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// The API key, if one is set and is not the sample placeholder.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != API_KEY_PLACEHOLDER)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 150,
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

/// Chat orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Number of prior messages sent to the model as context.
    pub context_window: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { context_window: 10 }
    }
}
