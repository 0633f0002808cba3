//! CLI command implementations

pub mod collection;
pub mod config;
pub mod entity;
pub mod index;
pub mod xref;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use xrefcache_client::{FetchCoordinator, FetchOutcome, RemoteApi};
use xrefcache_config::{ConfigLoader, XrefConfig};
use xrefcache_core::XrefStores;

use crate::GlobalOptions;

/// Longest label printed in tables.
pub const MAX_LABEL: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

/// Directory searched for the local config.
pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}

/// Load configuration: global, local, `--config`, then CLI overrides.
pub fn load_config(global: &GlobalOptions) -> Result<XrefConfig> {
    let root = current_dir()?;
    let mut loader = ConfigLoader::new();
    loader
        .load_with_file(
            &root,
            global.config.as_deref(),
            Some(&global.to_config_overrides()),
        )
        .context("Failed to load configuration")
}

/// Build a coordinator over fresh stores and the configured server.
pub fn create_coordinator(config: &XrefConfig) -> Result<FetchCoordinator> {
    let api = RemoteApi::from_config(&config.api).context("Failed to create API client")?;
    tracing::debug!(url = %api.base_url(), "using API server");

    let stores = Arc::new(XrefStores::new(config.cache.event_capacity));
    Ok(FetchCoordinator::new(Arc::new(api), stores))
}

/// Turn a failed fetch into an error with context.
pub fn ensure_fetched(outcome: FetchOutcome, what: &str) -> Result<()> {
    match outcome {
        FetchOutcome::Failed(err) => {
            Err(anyhow::Error::new(err).context(format!("Failed to load {}", what)))
        }
        _ => Ok(()),
    }
}

/// Print a value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}
