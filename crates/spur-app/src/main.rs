//! Spur application binary - composition root.
//!
//! 1. Parse CLI flags and load the config file
//! 2. Initialise tracing, then apply env and flag overrides
//! 3. Open the SQLite database
//! 4. Wire the store and reply generator into the API state
//! 5. Serve HTTP until ctrl-c

mod cli;

use std::sync::Arc;

use clap::Parser;

use spur_api::state::AppState;
use spur_chat::OpenAiGenerator;
use spur_core::config::SpurConfig;
use spur_storage::{ConversationRepository, Database};

use crate::cli::{expand_home, CliArgs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config file. Overrides that may log are applied after tracing starts.
    let config_file = args.resolve_config_path();
    let config_found = config_file.exists();
    let mut config = if config_found {
        SpurConfig::load(&config_file)?
    } else {
        SpurConfig::default()
    };
    let log_level = args
        .resolve_log_level()
        .or_else(|| std::env::var("SPUR_LOG").ok())
        .unwrap_or_else(|| config.general.log_level.clone());

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    config.apply_env_overrides();
    args.apply_to(&mut config);
    config.validate()?;

    tracing::info!("Starting Spur v{}", env!("CARGO_PKG_VERSION"));
    if config_found {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::info!(path = %config_file.display(), "No config file, using defaults");
    }

    // Storage.
    let data_dir = expand_home(&config.general.data_dir);
    let db_path = data_dir.join("spur.db");
    let db = match Database::new(&db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            tracing::error!(path = %db_path.display(), error = %e, "Failed to open database");
            return Err(e.into());
        }
    };
    tracing::info!(path = %db_path.display(), "SQLite database opened");
    let store = Arc::new(ConversationRepository::new(db));

    // Reply generator.
    let generator = OpenAiGenerator::from_config(&config.llm);
    if generator.is_configured() {
        tracing::info!(model = %config.llm.model, "LLM provider configured");
    } else {
        tracing::warn!("OPENAI_API_KEY is not set; replies will use the offline fallback");
    }

    // API server.
    let state = AppState::new(config.clone(), store, Arc::new(generator));
    spur_api::start_server(&config, state).await?;

    tracing::info!("Spur stopped");
    Ok(())
}
