use anyhow::{Context, Result};
use std::path::Path;

use super::{print_json, short_id};
use crate::store::{SqliteStore, StorageAdapter};

pub fn list(store: &SqliteStore, json: bool) -> Result<()> {
    let projects = store.list_projects()?;
    if json {
        return print_json(&projects);
    }
    if projects.is_empty() {
        println!("No projects found. Run 'lorekeep migrate' in a project root.");
        return Ok(());
    }

    println!("{:<10} {:<20} {:<20} {}", "ID", "Name", "Created", "Root");
    println!("{}", "-".repeat(85));
    for p in projects {
        println!(
            "{:<10} {:<20} {:<20} {}",
            short_id(&p.id),
            p.name,
            p.created_at.get(..19).unwrap_or(&p.created_at),
            p.root_path
        );
    }
    Ok(())
}

/// Re-point a project after its directory moved.
pub fn move_root(store: &SqliteStore, project_id_query: &str, new_root: &str) -> Result<()> {
    let projects = store.list_projects()?;
    let project = projects
        .iter()
        .find(|p| p.id.starts_with(project_id_query) || p.name == project_id_query)
        .ok_or_else(|| anyhow::anyhow!("Project not found: {}", project_id_query))?;

    let root = Path::new(new_root)
        .canonicalize()
        .with_context(|| format!("Cannot resolve {}", new_root))?;
    let moved = store.move_project(&project.id, &root)?;
    println!("Project '{}' now rooted at {}", moved.name, moved.root_path);
    Ok(())
}
