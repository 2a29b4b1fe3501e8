//! Listing commands: sessions, plans, patterns

use anyhow::Result;

use super::{print_json, truncate};
use crate::model::QueryResult;
use crate::query::{PatternQuery, PlanQuery, QueryEngine, SessionQuery};
use crate::store::SqliteStore;

pub fn sessions(
    engine: &QueryEngine<'_, SqliteStore>,
    query: &SessionQuery,
    json: bool,
) -> Result<()> {
    let result = engine.sessions(query)?;
    if json {
        return print_json(&result);
    }
    if result.items.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    println!(
        "{:<12} {:<12} {:<28} {:<24} {}",
        "Date", "Status", "ID", "Topics", "Topic"
    );
    println!("{}", "-".repeat(100));

    for session in &result.items {
        println!(
            "{:<12} {:<12} {:<28} {:<24} {}",
            session.date,
            session.status,
            truncate(&session.id, 28),
            truncate(&session.topics.join(","), 24),
            truncate(&session.topic, 35),
        );
    }

    print_footer(&result);
    Ok(())
}

pub fn plans(engine: &QueryEngine<'_, SqliteStore>, query: &PlanQuery, json: bool) -> Result<()> {
    let result = engine.plans(query)?;
    if json {
        return print_json(&result);
    }
    if result.items.is_empty() {
        println!("No plans found.");
        return Ok(());
    }

    println!("{:<28} {:<10} {:<12} {}", "ID", "Status", "Created", "Title");
    println!("{}", "-".repeat(90));

    for plan in &result.items {
        let created = plan
            .created
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<28} {:<10} {:<12} {}",
            truncate(&plan.id, 28),
            plan.status,
            created,
            truncate(&plan.title, 40),
        );
    }

    print_footer(&result);
    Ok(())
}

pub fn patterns(
    engine: &QueryEngine<'_, SqliteStore>,
    query: &PatternQuery,
    json: bool,
) -> Result<()> {
    let result = engine.patterns(query)?;
    if json {
        return print_json(&result);
    }
    if result.items.is_empty() {
        println!("No learned patterns found.");
        return Ok(());
    }

    println!("{:<16} {:<32} {:<24} {}", "Category", "ID", "Keywords", "Title");
    println!("{}", "-".repeat(100));

    for pattern in &result.items {
        println!(
            "{:<16} {:<32} {:<24} {}",
            truncate(&pattern.category, 16),
            truncate(&pattern.id, 32),
            truncate(&pattern.keywords.join(","), 24),
            truncate(&pattern.title, 35),
        );
    }

    print_footer(&result);
    Ok(())
}

fn print_footer<T>(result: &QueryResult<T>) {
    if result.total > result.count {
        println!("\nShowing {} of {}", result.count, result.total);
    }
}
