//! Config command - View and manage configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use xrefcache_config::{ConfigLoader, XrefConfig};

use super::{current_dir, print_json, OutputFormat};
use crate::GlobalOptions;

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show(ShowArgs),

    /// Write a default configuration file
    Init(InitArgs),

    /// Show configuration file paths
    Path(PathArgs),
}

/// Arguments for the show command
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Output format: text (TOML, default), json
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    output: OutputFormat,
}

/// Arguments for the init command
#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Create ~/.xrefcache/config.toml instead of ./.xrefcache/config.toml
    #[arg(long)]
    global: bool,
}

/// Arguments for the path command
#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Output format: text (default), json
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    output: OutputFormat,
}

/// Configuration paths
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPaths {
    /// Global config file path
    pub global: Option<PathBuf>,
    /// Local config file path
    pub local: PathBuf,
    /// Whether global config exists
    pub global_exists: bool,
    /// Whether local config exists
    pub local_exists: bool,
}

/// Execute the config command
///
/// `config` is the loaded configuration or the error loading it; only
/// `show` needs it.
pub async fn execute(
    cmd: ConfigCommand,
    config: Result<XrefConfig>,
    global: GlobalOptions,
) -> Result<()> {
    match cmd {
        ConfigCommand::Show(args) => execute_show(args, config?),
        ConfigCommand::Init(args) => execute_init(args, global),
        ConfigCommand::Path(args) => execute_path(args),
    }
}

fn execute_show(args: ShowArgs, config: XrefConfig) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    match args.output {
        OutputFormat::Json => print_json(&config)?,
        OutputFormat::Text => {
            let rendered =
                toml::to_string_pretty(&config).context("Failed to render configuration")?;
            print!("{}", rendered);
        }
    }
    Ok(())
}

fn execute_init(args: InitArgs, global: GlobalOptions) -> Result<()> {
    let loader = ConfigLoader::new();
    let path = if args.global {
        loader.init_global()?
    } else {
        loader.init_local(&current_dir()?)?
    };

    if !global.quiet {
        println!("Configuration file: {}", path.display());
    }
    Ok(())
}

fn execute_path(args: PathArgs) -> Result<()> {
    let loader = ConfigLoader::new();
    let root = current_dir()?;

    let global_path = loader.global_config_path();
    let local_path = loader.local_config_path(&root);
    let paths = ConfigPaths {
        global_exists: global_path.as_ref().is_some_and(|p| p.exists()),
        local_exists: local_path.exists(),
        global: global_path,
        local: local_path,
    };

    match args.output {
        OutputFormat::Json => print_json(&paths)?,
        OutputFormat::Text => {
            match paths.global {
                Some(ref path) => println!(
                    "Global: {} ({})",
                    path.display(),
                    exists_label(paths.global_exists)
                ),
                None => println!("Global: <no home directory>"),
            }
            println!(
                "Local:  {} ({})",
                paths.local.display(),
                exists_label(paths.local_exists)
            );
        }
    }
    Ok(())
}

fn exists_label(exists: bool) -> &'static str {
    if exists {
        "exists"
    } else {
        "not found"
    }
}
