//! Collection command - Show a collection

use anyhow::{Context, Result};
use clap::Args;
use xrefcache_config::XrefConfig;

use super::{create_coordinator, ensure_fetched, print_json, OutputFormat};

/// Arguments for the collection command
#[derive(Args, Debug)]
pub struct CollectionArgs {
    /// Collection id
    id: String,

    /// Output format: text (default), json
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    output: OutputFormat,
}

/// Execute the collection command
pub async fn execute(args: CollectionArgs, config: XrefConfig) -> Result<()> {
    let coordinator = create_coordinator(&config)?;

    let outcome = coordinator.request_collection(&args.id).await;
    ensure_fetched(outcome, &format!("collection '{}'", args.id))?;

    let collection = coordinator
        .stores()
        .collections
        .get(&args.id)
        .into_value()
        .context("Collection not available")?;

    match args.output {
        OutputFormat::Json => print_json(&collection)?,
        OutputFormat::Text => {
            println!("{}", collection.label);
            println!("  id: {}", collection.id);
            if let Some(ref ui) = collection.links.ui {
                println!("  ui: {}", ui);
            }
        }
    }
    Ok(())
}
