//! Entity command - Show a single entity

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use xrefcache_config::XrefConfig;
use xrefcache_core::Entity;

use super::{create_coordinator, ensure_fetched, print_json, OutputFormat};

/// Arguments for the entity command
#[derive(Args, Debug)]
pub struct EntityArgs {
    /// Entity id
    id: String,

    /// Label documents by file name
    #[arg(long)]
    document: bool,

    /// Output format: text (default), json
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    output: OutputFormat,
}

/// Execute the entity command
pub async fn execute(args: EntityArgs, config: XrefConfig) -> Result<()> {
    let coordinator = create_coordinator(&config)?;

    let outcome = coordinator.request_entity(&args.id).await;
    ensure_fetched(outcome, &format!("entity '{}'", args.id))?;

    let entity = coordinator
        .stores()
        .entities
        .get(&args.id)
        .into_value()
        .context("Entity not available")?;

    match args.output {
        OutputFormat::Json => print_json(&entity)?,
        OutputFormat::Text => print_entity(&entity, args.document),
    }
    Ok(())
}

fn print_entity(entity: &Entity, document_mode: bool) {
    let label = entity
        .label(document_mode)
        .unwrap_or_else(|| "Untitled".to_string());
    println!("{} ({})", label, entity.schema);
    println!("  id: {}", entity.id);
    for (name, values) in &entity.properties {
        if values.is_empty() {
            continue;
        }
        let rendered: Vec<String> = values.iter().map(render_value).collect();
        println!("  {}: {}", name, rendered.join("; "));
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
