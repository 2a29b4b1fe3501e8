//! Keyword search over the derived FTS5 index
//!
//! Candidates come from two passes over `knowledge_fts`: an FTS5 token match
//! (prefix-expanded, ranked by bm25) and a plain case-insensitive substring
//! match of the whole query, so an exact phrase is never missed because of
//! tokenization. Relevance blends both signals; ties fall back to
//! `updated_at` descending and then the identity key.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rusqlite::{params, Connection};

use crate::error::{LoreError, Result};
use crate::model::{
    ArtifactKind, IndexStats, SearchHit, SearchRequest, SearchResults, MAX_LIMIT,
};

const SNIPPET_BEFORE: usize = 60;
const SNIPPET_AFTER: usize = 140;

const PHRASE_WEIGHT: f64 = 0.5;
const COVERAGE_WEIGHT: f64 = 0.3;
const BM25_WEIGHT: f64 = 0.2;

/// One row of the search index, derived from a canonical record.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct IndexEntry {
    kind: ArtifactKind,
    item_id: String,
    project_id: String,
    updated_at: String,
    title: String,
    tags: String,
    content: String,
}

impl IndexEntry {
    pub(super) fn session(
        project_id: &str,
        id: &str,
        topic: &str,
        topics: &[String],
        author: Option<&str>,
        content: &str,
        updated_at: &str,
    ) -> Self {
        Self {
            kind: ArtifactKind::Session,
            item_id: id.to_string(),
            project_id: project_id.to_string(),
            updated_at: updated_at.to_string(),
            title: topic.to_string(),
            tags: join_tags(topics.iter().map(String::as_str).chain(author)),
            content: content.to_string(),
        }
    }

    pub(super) fn plan(
        project_id: &str,
        id: &str,
        title: &str,
        topics: &[String],
        author: Option<&str>,
        content: &str,
        updated_at: &str,
    ) -> Self {
        Self {
            kind: ArtifactKind::Plan,
            item_id: id.to_string(),
            project_id: project_id.to_string(),
            updated_at: updated_at.to_string(),
            title: title.to_string(),
            tags: join_tags(std::iter::once(id).chain(topics.iter().map(String::as_str)).chain(author)),
            content: content.to_string(),
        }
    }

    pub(super) fn pattern(
        project_id: &str,
        id: &str,
        title: &str,
        category: &str,
        keywords: &[String],
        content: &str,
        updated_at: &str,
    ) -> Self {
        Self {
            kind: ArtifactKind::Pattern,
            item_id: id.to_string(),
            project_id: project_id.to_string(),
            updated_at: updated_at.to_string(),
            title: title.to_string(),
            tags: join_tags(std::iter::once(category).chain(keywords.iter().map(String::as_str))),
            content: content.to_string(),
        }
    }
}

fn join_tags<'a>(tags: impl Iterator<Item = &'a str>) -> String {
    tags.collect::<Vec<_>>().join(" ")
}

/// Replace the index row for one record. Runs inside the caller's
/// transaction.
pub(super) fn index_entry(conn: &Connection, entry: &IndexEntry) -> Result<()> {
    conn.execute(
        "DELETE FROM knowledge_fts WHERE kind = ?1 AND project_id = ?2 AND item_id = ?3",
        params![entry.kind.as_str(), entry.project_id, entry.item_id],
    )?;
    insert_entry(conn, entry)
}

fn insert_entry(conn: &Connection, entry: &IndexEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO knowledge_fts (kind, item_id, project_id, updated_at, title, tags, content)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.kind.as_str(),
            entry.item_id,
            entry.project_id,
            entry.updated_at,
            entry.title,
            entry.tags,
            entry.content,
        ],
    )?;
    Ok(())
}

/// Drop and repopulate the index from the canonical tables in one
/// transaction.
pub(super) fn rebuild_index(conn: &Connection) -> Result<IndexStats> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM knowledge_fts", [])?;

    let mut stats = IndexStats::default();

    {
        let mut stmt = tx.prepare(
            "SELECT project_id, id, topic, topics, author, content, updated_at
             FROM sessions ORDER BY project_id, id",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let topics: Vec<String> = serde_json::from_str(&row.get::<_, String>(3)?)?;
            let author: Option<String> = row.get(4)?;
            let entry = IndexEntry::session(
                &row.get::<_, String>(0)?,
                &row.get::<_, String>(1)?,
                &row.get::<_, String>(2)?,
                &topics,
                author.as_deref(),
                &row.get::<_, String>(5)?,
                &row.get::<_, String>(6)?,
            );
            insert_entry(&tx, &entry)?;
            stats.sessions_indexed += 1;
        }
    }

    {
        let mut stmt = tx.prepare(
            "SELECT project_id, id, title, topics, author, content, updated_at
             FROM plans ORDER BY project_id, id",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let topics: Vec<String> = serde_json::from_str(&row.get::<_, String>(3)?)?;
            let author: Option<String> = row.get(4)?;
            let entry = IndexEntry::plan(
                &row.get::<_, String>(0)?,
                &row.get::<_, String>(1)?,
                &row.get::<_, String>(2)?,
                &topics,
                author.as_deref(),
                &row.get::<_, String>(5)?,
                &row.get::<_, String>(6)?,
            );
            insert_entry(&tx, &entry)?;
            stats.plans_indexed += 1;
        }
    }

    {
        let mut stmt = tx.prepare(
            "SELECT project_id, id, title, category, keywords, content, updated_at
             FROM learned_patterns ORDER BY project_id, id",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let keywords: Vec<String> = serde_json::from_str(&row.get::<_, String>(4)?)?;
            let entry = IndexEntry::pattern(
                &row.get::<_, String>(0)?,
                &row.get::<_, String>(1)?,
                &row.get::<_, String>(2)?,
                &row.get::<_, String>(3)?,
                &keywords,
                &row.get::<_, String>(5)?,
                &row.get::<_, String>(6)?,
            );
            insert_entry(&tx, &entry)?;
            stats.patterns_indexed += 1;
        }
    }

    tx.commit()?;
    tracing::info!(
        "Rebuilt search index: {} sessions, {} plans, {} patterns",
        stats.sessions_indexed,
        stats.plans_indexed,
        stats.patterns_indexed
    );
    Ok(stats)
}

#[derive(Debug)]
struct Candidate {
    kind: ArtifactKind,
    item_id: String,
    project_id: String,
    updated_at: String,
    title: String,
    tags: String,
    content: String,
    /// Negated bm25, so larger is better. `None` when only the substring
    /// pass found the row.
    bm25: Option<f64>,
}

type CandidateKey = (ArtifactKind, String, String);

pub(super) fn search(conn: &Connection, request: &SearchRequest) -> Result<SearchResults> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(LoreError::validation("search query must not be empty"));
    }

    let kinds = request.scope.kinds();
    let limit = request.limit.clamp(1, MAX_LIMIT);
    // SQLite's lower() only folds ASCII, match that here
    let phrase = query.to_ascii_lowercase();
    let tokens = tokenize(query);

    let mut candidates: BTreeMap<CandidateKey, Candidate> = BTreeMap::new();

    if let Some(fts_query) = build_fts_query(&tokens) {
        let mut stmt = conn.prepare(
            "SELECT kind, item_id, project_id, updated_at, title, tags, content,
                    bm25(knowledge_fts, 0.0, 0.0, 0.0, 0.0, 10.0, 5.0, 1.0)
             FROM knowledge_fts
             WHERE knowledge_fts MATCH ?1 AND (?2 IS NULL OR project_id = ?2)",
        )?;
        let mut rows = stmt.query(params![fts_query, request.project_id])?;
        while let Some(row) = rows.next()? {
            let Some(candidate) = read_candidate(row, kinds, true)? else {
                continue;
            };
            candidates.insert(
                (candidate.kind, candidate.project_id.clone(), candidate.item_id.clone()),
                candidate,
            );
        }
    }

    {
        let mut stmt = conn.prepare(
            "SELECT kind, item_id, project_id, updated_at, title, tags, content
             FROM knowledge_fts
             WHERE (instr(lower(content), ?1) > 0
                    OR instr(lower(title), ?1) > 0
                    OR instr(lower(tags), ?1) > 0)
               AND (?2 IS NULL OR project_id = ?2)",
        )?;
        let mut rows = stmt.query(params![phrase, request.project_id])?;
        while let Some(row) = rows.next()? {
            let Some(candidate) = read_candidate(row, kinds, false)? else {
                continue;
            };
            candidates
                .entry((candidate.kind, candidate.project_id.clone(), candidate.item_id.clone()))
                .or_insert(candidate);
        }
    }

    let max_bm25 = candidates
        .values()
        .filter_map(|c| c.bm25)
        .fold(0.0_f64, f64::max);

    let mut hits: Vec<SearchHit> = candidates
        .into_values()
        .map(|candidate| score(candidate, &phrase, &tokens, max_bm25))
        .collect();

    hits.sort_by(compare_hits);
    hits.truncate(limit);

    tracing::debug!("Search '{}' returned {} results", query, hits.len());

    Ok(SearchResults {
        query: query.to_string(),
        count: hits.len(),
        results: hits,
    })
}

fn read_candidate(
    row: &rusqlite::Row<'_>,
    kinds: &[ArtifactKind],
    with_bm25: bool,
) -> Result<Option<Candidate>> {
    let kind: ArtifactKind = row.get::<_, String>(0)?.parse()?;
    if !kinds.contains(&kind) {
        return Ok(None);
    }

    let bm25 = if with_bm25 {
        Some(-row.get::<_, f64>(7)?)
    } else {
        None
    };

    Ok(Some(Candidate {
        kind,
        item_id: row.get(1)?,
        project_id: row.get(2)?,
        updated_at: row.get(3)?,
        title: row.get(4)?,
        tags: row.get(5)?,
        content: row.get(6)?,
        bm25,
    }))
}

fn score(candidate: Candidate, phrase: &str, tokens: &[String], max_bm25: f64) -> SearchHit {
    let haystack = format!(
        "{}\n{}\n{}",
        candidate.title.to_ascii_lowercase(),
        candidate.tags.to_ascii_lowercase(),
        candidate.content.to_ascii_lowercase()
    );

    let phrase_hit = if haystack.contains(phrase) { 1.0 } else { 0.0 };
    let coverage = if tokens.is_empty() {
        0.0
    } else {
        let matched = tokens.iter().filter(|t| haystack.contains(t.as_str())).count();
        matched as f64 / tokens.len() as f64
    };
    let bm25 = match candidate.bm25 {
        Some(value) if max_bm25 > 0.0 => (value / max_bm25).clamp(0.0, 1.0),
        _ => 0.0,
    };

    let relevance =
        PHRASE_WEIGHT * phrase_hit + COVERAGE_WEIGHT * coverage + BM25_WEIGHT * bm25;

    SearchHit {
        kind: candidate.kind,
        snippet: snippet(&candidate.content, phrase, tokens),
        id: candidate.item_id,
        project_id: candidate.project_id,
        title: candidate.title,
        relevance: (relevance * 10_000.0).round() / 10_000.0,
        updated_at: candidate.updated_at,
    }
}

fn compare_hits(a: &SearchHit, b: &SearchHit) -> Ordering {
    b.relevance
        .total_cmp(&a.relevance)
        .then_with(|| b.updated_at.cmp(&a.updated_at))
        .then_with(|| a.kind.cmp(&b.kind))
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.project_id.cmp(&b.project_id))
}

/// Lowercased alphanumeric words, deduplicated, in query order.
fn tokenize(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for word in query.split(|c: char| !c.is_alphanumeric()) {
        let word = word.to_lowercase();
        if !word.is_empty() && !tokens.contains(&word) {
            tokens.push(word);
        }
    }
    tokens
}

/// Quoted prefix terms joined with OR, so FTS5 operators in user input are
/// never interpreted.
fn build_fts_query(tokens: &[String]) -> Option<String> {
    if tokens.is_empty() {
        return None;
    }
    Some(
        tokens
            .iter()
            .map(|t| format!("\"{}\"*", t.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(" OR "),
    )
}

/// Window of the body around the first phrase (or token) match.
fn snippet(content: &str, phrase: &str, tokens: &[String]) -> String {
    let lowered = content.to_ascii_lowercase();
    let position = lowered
        .find(phrase)
        .or_else(|| tokens.iter().find_map(|t| lowered.find(t.as_str())))
        .unwrap_or(0);

    let mut start = position.saturating_sub(SNIPPET_BEFORE);
    while !content.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (position + SNIPPET_AFTER).min(content.len());
    while !content.is_char_boundary(end) {
        end += 1;
    }

    let mut text = content[start..end]
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if start > 0 {
        text.insert_str(0, "...");
    }
    if end < content.len() {
        text.push_str("...");
    }
    text
}
