//! Xref command - Show matches between two collections
//!
//! Loads both collections, the anchor's index and the first page of matches
//! concurrently, then follows continuation cursors for `--pages` more pages.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use xrefcache_config::XrefConfig;
use xrefcache_core::{
    truncate_label, Collection, Entity, IndexEntry, ResultPage, XrefMatch, XrefStores,
};

use super::{create_coordinator, ensure_fetched, print_info, print_json, OutputFormat, MAX_LABEL};
use crate::GlobalOptions;

/// Arguments for the xref command
#[derive(Args, Debug)]
pub struct XrefArgs {
    /// Anchor collection id
    collection: String,

    /// Counterpart collection id
    other: String,

    /// Additional pages to load after the first
    #[arg(long, short = 'p', default_value = "0")]
    pages: usize,

    /// Output format: text (default), json
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    output: OutputFormat,
}

/// JSON view of a loaded match screen
#[derive(Debug, Serialize)]
struct XrefOutput<'a> {
    collection: &'a Collection,
    other: &'a Collection,
    index: &'a IndexEntry,
    matches: &'a ResultPage<XrefMatch>,
    entities: Vec<Entity>,
}

/// Execute the xref command
pub async fn execute(args: XrefArgs, config: XrefConfig, global: GlobalOptions) -> Result<()> {
    let coordinator = create_coordinator(&config)?;

    let mut screen = coordinator
        .load_xref_screen(&args.collection, &args.other)
        .await;
    if let Some(err) = screen.error() {
        return Err(anyhow::Error::new(err.clone()).context(format!(
            "Failed to load matches between '{}' and '{}'",
            args.collection, args.other
        )));
    }

    for _ in 0..args.pages {
        if !screen.can_load_more() {
            print_info("All matches loaded", global.quiet);
            break;
        }
        let outcome = coordinator
            .request_more(&args.collection, &args.other)
            .await;
        ensure_fetched(outcome, "next page of matches")?;
        screen = coordinator
            .stores()
            .xref_screen(&args.collection, &args.other);
    }

    let (Some(collection), Some(other), Some(index), Some(matches)) = (
        screen.collection.value(),
        screen.other.value(),
        screen.index.value(),
        screen.matches.value(),
    ) else {
        bail!("Match screen is incomplete");
    };

    if let Some(ref err) = matches.expand_error {
        tracing::warn!(error = %err, "last page failed to load");
    }

    let stores = coordinator.stores();
    match args.output {
        OutputFormat::Json => {
            let output = XrefOutput {
                collection,
                other,
                index,
                matches,
                entities: match_entities(stores, &collection.id, matches),
            };
            print_json(&output)?;
        }
        OutputFormat::Text => print_matches(stores, collection, other, matches),
    }
    Ok(())
}

/// Entities referenced by the page, in item order, `collection_id`'s side
/// first.
fn match_entities(
    stores: &XrefStores,
    collection_id: &str,
    page: &ResultPage<XrefMatch>,
) -> Vec<Entity> {
    page.items
        .iter()
        .flat_map(|item| {
            let (own, counterpart) = item.sides(collection_id);
            [own, counterpart]
        })
        .filter_map(|id| stores.entities.get(id).into_value())
        .collect()
}

fn entity_label(stores: &XrefStores, id: &str) -> String {
    let label = stores
        .entities
        .get(id)
        .value()
        .and_then(|entity| entity.label(false))
        .unwrap_or_else(|| "Untitled".to_string());
    truncate_label(&label, MAX_LABEL)
}

fn print_matches(
    stores: &XrefStores,
    collection: &Collection,
    other: &Collection,
    page: &ResultPage<XrefMatch>,
) {
    println!(
        "{} vs {}: {} of {} matches",
        collection.label,
        other.label,
        page.len(),
        page.total
    );
    println!();

    for item in &page.items {
        let (own, counterpart) = item.sides(&collection.id);
        println!(
            "  {:>5.2}  {:<width$}  {}",
            item.score,
            entity_label(stores, own),
            entity_label(stores, counterpart),
            width = MAX_LABEL + 1
        );
    }

    if page.can_expand() {
        println!();
        println!("More matches available (use --pages to load them)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_label_falls_back() {
        let stores = XrefStores::new(16);
        stores.entities.put(
            "e1",
            Entity::new("e1", "Person").with_property("name", ["Jane Doe"]),
        );
        stores.entities.put("e2", Entity::new("e2", "Person"));

        assert_eq!(entity_label(&stores, "e1"), "Jane Doe");
        assert_eq!(entity_label(&stores, "e2"), "Untitled");
        assert_eq!(entity_label(&stores, "missing"), "Untitled");
    }

    #[test]
    fn test_match_entities_follow_requested_side() {
        let stores = XrefStores::new(16);
        for id in ["c1-a", "c2-b"] {
            stores.entities.put(id, Entity::new(id, "Company"));
        }
        let page = ResultPage::new(
            vec![XrefMatch::new("1", 0.9, "c1", "c1-a", "c2-b")],
            1,
            None,
        );

        let ids = |collection_id: &str| -> Vec<String> {
            match_entities(&stores, collection_id, &page)
                .into_iter()
                .map(|e| e.id)
                .collect()
        };
        assert_eq!(ids("c1"), vec!["c1-a", "c2-b"]);
        assert_eq!(ids("c2"), vec!["c2-b", "c1-a"]);
    }

    #[test]
    fn test_match_entities_in_item_order() {
        let stores = XrefStores::new(16);
        for id in ["a", "b", "c"] {
            stores.entities.put(id, Entity::new(id, "Company"));
        }
        let page = ResultPage::new(
            vec![
                XrefMatch::new("1", 0.9, "x", "a", "b"),
                XrefMatch::new("2", 0.5, "x", "c", "missing"),
            ],
            2,
            None,
        );

        let ids: Vec<String> = match_entities(&stores, "x", &page)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
