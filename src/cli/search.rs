//! Search command implementation

use anyhow::Result;

use super::{print_json, truncate};
use crate::query::QueryEngine;
use crate::store::SqliteStore;

pub fn run(
    engine: &QueryEngine<'_, SqliteStore>,
    query: &str,
    scope: &str,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let results = engine.search(query, scope, limit)?;
    if json {
        return print_json(&results);
    }

    if results.results.is_empty() {
        println!("No matches for '{}'.", results.query);
        return Ok(());
    }

    println!("{:<8} {:<9} {:<32} {}", "Score", "Kind", "ID", "Title");
    println!("{}", "-".repeat(90));

    for hit in &results.results {
        println!(
            "{:<8.4} {:<9} {:<32} {}",
            hit.relevance,
            hit.kind,
            truncate(&hit.id, 32),
            truncate(&hit.title, 40),
        );
        if !hit.snippet.is_empty() {
            println!("         {}", truncate(&hit.snippet, 80));
        }
    }

    println!("\n{} result(s)", results.count);
    Ok(())
}
