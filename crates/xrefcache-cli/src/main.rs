//! xrefcache CLI - Browse entities and cross-reference matches
//!
//! A command-line client for an entity investigation server. Every command
//! goes through the same stores and fetch coordinator an interactive client
//! would use, so repeated or concurrent requests are never sent twice.
//!
//! # Usage
//!
//! ```bash
//! # Show an entity
//! xrefcache entity 3f2a9c
//!
//! # List the collections that have matches against collection 12
//! xrefcache index 12
//!
//! # Show matches between two collections, loading two more pages
//! xrefcache xref 12 31 --pages 2
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use xrefcache_config::{LogFormat, LoggingConfig};

mod commands;

/// xrefcache - Entity cache and cross-reference browser
#[derive(Parser, Debug)]
#[command(name = "xrefcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// Path to configuration file
    #[arg(long, short = 'c', global = true, env = "XREFCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// API server URL
    #[arg(long, global = true, env = "XREFCACHE_API_URL")]
    pub api_url: Option<String>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> xrefcache_config::ConfigOverrides {
        xrefcache_config::ConfigOverrides {
            api_url: self.api_url.clone(),
            log_level: if self.quiet {
                Some("error".to_string())
            } else if self.verbose {
                Some("debug".to_string())
            } else {
                None
            },
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show a single entity
    Entity(commands::entity::EntityArgs),

    /// Show a collection
    Collection(commands::collection::CollectionArgs),

    /// List collections with matches against a collection
    Index(commands::index::IndexArgs),

    /// Show matches between two collections
    Xref(commands::xref::XrefArgs),

    /// View and manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

/// Install the global tracing subscriber on stderr.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    match logging.format {
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config file is reported once logging is up
    let config = commands::load_config(&cli.global);
    let mut logging = match config {
        Ok(ref config) => config.logging.clone(),
        Err(_) => LoggingConfig::default(),
    };
    if let Some(level) = cli.global.to_config_overrides().log_level {
        logging.level = level;
    }
    init_logging(&logging)?;

    match cli.command {
        Commands::Entity(args) => commands::entity::execute(args, config?).await,
        Commands::Collection(args) => commands::collection::execute(args, config?).await,
        Commands::Index(args) => commands::index::execute(args, config?).await,
        Commands::Xref(args) => commands::xref::execute(args, config?, cli.global).await,
        // init and path work without a readable config
        Commands::Config(cmd) => commands::config::execute(cmd, config, cli.global).await,
    }
}
