//! Migrate command implementation

use std::path::Path;

use anyhow::{Context, Result};

use super::print_json;
use crate::config::Config;
use crate::migrate::Migrator;
use crate::store::SqliteStore;

pub fn run(store: &SqliteStore, config: &Config, root: &Path, json: bool) -> Result<()> {
    let result = Migrator::new(store, &config.knowledge)
        .migrate_from_directory(root)
        .with_context(|| format!("Migration of {} failed", root.display()))?;

    if json {
        return print_json(&result);
    }

    if result.total_files == 0 && result.errors.is_empty() {
        println!(
            "No knowledge files under {}.",
            config.knowledge.root_for(root).display()
        );
        return Ok(());
    }

    println!("Sessions migrated:  {}", result.sessions_migrated);
    println!("Plans migrated:     {}", result.plans_migrated);
    println!("Patterns migrated:  {}", result.learned_migrated);
    println!("Skipped (unchanged): {}", result.skipped + result.unchanged);
    println!("Files seen:         {}", result.total_files);

    if !result.errors.is_empty() {
        println!("\n{} file(s) could not be migrated:", result.errors.len());
        for error in &result.errors {
            println!("  ✗ {}", error);
        }
    }

    Ok(())
}
