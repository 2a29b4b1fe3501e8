//! Command implementations for the `lorekeep` binary

pub mod list;
pub mod migrate;
pub mod project;
pub mod search;
pub mod show;
pub mod stats;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::Config;
use crate::query::{Limits, QueryEngine};
use crate::store::{SqliteStore, StorageAdapter};

/// Which project a read command looks at.
#[derive(Debug, Clone)]
pub enum ProjectScope {
    /// The project registered for this root directory
    Root(PathBuf),
    AllProjects,
}

impl ProjectScope {
    pub fn new(root: &Path, all_projects: bool) -> Self {
        if all_projects {
            ProjectScope::AllProjects
        } else {
            ProjectScope::Root(root.to_path_buf())
        }
    }
}

/// Build a query engine scoped the way the user asked.
pub fn engine<'a>(
    store: &'a SqliteStore,
    config: &Config,
    scope: &ProjectScope,
) -> Result<QueryEngine<'a, SqliteStore>> {
    let engine = QueryEngine::new(store).with_limits(Limits::from(config));

    match scope {
        ProjectScope::AllProjects => Ok(engine),
        ProjectScope::Root(root) => {
            let canonical = root
                .canonicalize()
                .with_context(|| format!("Cannot resolve {}", root.display()))?;
            let project = store.find_project_by_path(&canonical)?.ok_or_else(|| {
                anyhow::anyhow!(
                    "No knowledge migrated for {}. Run 'lorekeep migrate' first.",
                    canonical.display()
                )
            })?;
            Ok(engine.for_project(project.id))
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// First line of `text`, cut to `max` characters with a trailing `...`
pub fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or(text);
    if line.chars().count() > max {
        let cut: String = line.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}

/// Short form of a UUID for tables
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
        assert_eq!(truncate("first\nsecond", 20), "first");
    }

    #[test]
    fn short_id_handles_short_input() {
        assert_eq!(short_id("1234567890"), "12345678");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn unmigrated_root_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open_in_memory().unwrap();
        let err = engine(&store, &Config::default(), &ProjectScope::new(dir.path(), false))
            .err()
            .unwrap();
        assert!(err.to_string().contains("lorekeep migrate"));
    }
}
