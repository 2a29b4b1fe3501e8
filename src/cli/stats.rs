//! Stats and reindex commands

use anyhow::Result;

use super::{engine, print_json, ProjectScope};
use crate::config::Config;
use crate::store::{SqliteStore, StorageAdapter};

pub fn run(store: &SqliteStore, config: &Config, scope: &ProjectScope, json: bool) -> Result<()> {
    let project_id = scoped_project(store, config, scope)?;
    let stats = store.stats(project_id.as_deref())?;
    if json {
        return print_json(&stats);
    }

    println!("Projects:       {}", stats.projects);
    println!("Sessions:       {}", stats.sessions);
    println!("Plans:          {}", stats.plans);
    println!("Patterns:       {}", stats.patterns);
    println!("Tracked files:  {}", stats.tracked_files);
    Ok(())
}

/// Project the totals are restricted to; `None` counts every project.
/// A root that was never migrated is an error rather than a silent
/// fallback to global numbers.
fn scoped_project(store: &SqliteStore, config: &Config, scope: &ProjectScope) -> Result<Option<String>> {
    match scope {
        ProjectScope::AllProjects => Ok(None),
        ProjectScope::Root(_) => Ok(engine(store, config, scope)?
            .project_id()
            .map(str::to_string)),
    }
}

pub fn reindex(store: &SqliteStore, json: bool) -> Result<()> {
    let stats = store.rebuild_index()?;
    if json {
        return print_json(&stats);
    }

    println!(
        "✅ Search index rebuilt: {} sessions, {} plans, {} patterns",
        stats.sessions_indexed, stats.plans_indexed, stats.patterns_indexed
    );
    Ok(())
}
