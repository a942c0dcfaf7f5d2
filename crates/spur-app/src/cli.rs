//! CLI argument definitions for the Spur server.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::{Path, PathBuf};

use spur_core::config::{RunMode, SpurConfig};

/// Spur - AI customer-support chat agent for the Spur Store.
#[derive(Parser, Debug)]
#[command(name = "spur", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// HTTP server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Data directory for the SQLite database.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Serve the built front-end instead of the dev banner.
    #[arg(long = "production")]
    pub production: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SPUR_CONFIG env var > ~/.spur/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_from(|key| std::env::var(key).ok())
    }

    fn resolve_config_path_from<F>(&self, lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = lookup("SPUR_CONFIG") {
            return PathBuf::from(p);
        }
        match home_dir(&lookup) {
            Some(home) => home.join(".spur").join("config.toml"),
            None => PathBuf::from("config.toml"),
        }
    }

    /// Resolve the data directory override, if any.
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log level override, if any.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }

    /// Apply every flag that was given on top of `config`.
    pub fn apply_to(&self, config: &mut SpurConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = self.resolve_data_dir() {
            config.general.data_dir = dir;
        }
        if let Some(level) = self.resolve_log_level() {
            config.general.log_level = level;
        }
        if self.production {
            config.server.mode = RunMode::Production;
        }
    }
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    expand_home_from(path, |key| std::env::var(key).ok())
}

fn expand_home_from<F>(path: &str, lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let rest = path
        .strip_prefix("~/")
        .or_else(|| path.strip_prefix("~\\"));
    match rest {
        Some(rest) => home_dir(&lookup)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => Path::new(path).to_path_buf(),
    }
}

fn home_dir<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    #[cfg(target_os = "windows")]
    let var = "USERPROFILE";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";
    lookup(var).map(PathBuf::from)
}
