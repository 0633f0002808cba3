//! Index command - List counterpart collections with match counts

use anyhow::{Context, Result};
use clap::Args;
use xrefcache_config::XrefConfig;
use xrefcache_core::{truncate_label, IndexAvailability, IndexEntry};

use super::{create_coordinator, ensure_fetched, print_json, OutputFormat, MAX_LABEL};

/// Arguments for the index command
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Anchor collection id
    collection: String,

    /// Output format: text (default), json
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    output: OutputFormat,
}

/// Execute the index command
pub async fn execute(args: IndexArgs, config: XrefConfig) -> Result<()> {
    let coordinator = create_coordinator(&config)?;

    let outcome = coordinator.request_index(&args.collection).await;
    ensure_fetched(outcome, &format!("index of collection '{}'", args.collection))?;

    let stores = coordinator.stores();
    let availability = stores.index_availability(&args.collection);
    let entry = stores
        .index
        .get(&args.collection)
        .into_value()
        .context("Index not available")?;

    match args.output {
        OutputFormat::Json => print_json(&entry)?,
        OutputFormat::Text => print_index(&args.collection, availability, &entry),
    }
    Ok(())
}

fn print_index(collection_id: &str, availability: IndexAvailability, entry: &IndexEntry) {
    if availability == IndexAvailability::LoadedEmpty {
        println!("No cross-reference matches for collection {}", collection_id);
        return;
    }

    println!(
        "Collection {}: {} counterpart collection(s)",
        collection_id, entry.total
    );
    for counterpart in &entry.results {
        println!(
            "  {:>8}  {} ({})",
            counterpart.matches,
            truncate_label(&counterpart.collection.label, MAX_LABEL),
            counterpart.collection.id
        );
    }
}
