//! Show command implementation: one artifact with its full content

use anyhow::Result;

use super::print_json;
use crate::model::ArtifactKind;
use crate::query::QueryEngine;
use crate::store::SqliteStore;

pub fn run(
    engine: &QueryEngine<'_, SqliteStore>,
    kind: ArtifactKind,
    id: &str,
    json: bool,
) -> Result<()> {
    match kind {
        ArtifactKind::Session => {
            let session = engine.session(id)?;
            if json {
                return print_json(&session);
            }
            print_header(&format!("Session: {}", session.id));
            println!("Date: {} | Status: {}", session.date, session.status);
            println!("Topic: {}", session.topic);
            if !session.topics.is_empty() {
                println!("Topics: {}", session.topics.join(", "));
            }
            if let Some(author) = &session.author {
                println!("Author: {}", author);
            }
            print_body(&session.source_path, &session.content);
        }
        ArtifactKind::Plan => {
            let plan = engine.plan(id)?;
            if json {
                return print_json(&plan);
            }
            print_header(&format!("Plan: {} ({})", plan.title, plan.id));
            println!("Status: {}", plan.status);
            if let Some(created) = plan.created {
                println!("Created: {}", created);
            }
            if let Some(author) = &plan.author {
                println!("Author: {}", author);
            }
            print_body(&plan.source_path, &plan.content);
        }
        ArtifactKind::Pattern => {
            let pattern = engine.pattern(id)?;
            if json {
                return print_json(&pattern);
            }
            print_header(&format!("Pattern: {} ({})", pattern.title, pattern.id));
            println!("Category: {}", pattern.category);
            if !pattern.keywords.is_empty() {
                println!("Keywords: {}", pattern.keywords.join(", "));
            }
            print_body(&pattern.source_path, &pattern.content);
        }
    }

    Ok(())
}

fn print_header(title: &str) {
    println!("\n{}", "=".repeat(80));
    println!("{}", title);
}

fn print_body(source_path: &str, content: &str) {
    println!("Source: {}", source_path);
    println!("{}", "=".repeat(80));
    println!("{}", content);
}
