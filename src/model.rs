//! Knowledge records, filters and result shapes shared across layers

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::LoreError;

/// Default page size when a caller does not pass a limit.
pub const DEFAULT_LIMIT: usize = 50;

/// Hard upper bound on any single listing or search page.
pub const MAX_LIMIT: usize = 500;

// ============================================
// ENUMS
// ============================================

/// The three kinds of knowledge artifact tracked per project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Session,
    Plan,
    Pattern,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Session => "session",
            ArtifactKind::Plan => "plan",
            ArtifactKind::Pattern => "pattern",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = LoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" | "sessions" => Ok(ArtifactKind::Session),
            "plan" | "plans" => Ok(ArtifactKind::Plan),
            "pattern" | "patterns" | "learned" => Ok(ArtifactKind::Pattern),
            other => Err(LoreError::validation(format!(
                "unknown artifact kind '{other}' (expected session, plan or pattern)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    #[default]
    InProgress,
    Complete,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in-progress",
            SessionStatus::Complete => "complete",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = LoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "in-progress" => Ok(SessionStatus::InProgress),
            "complete" | "completed" => Ok(SessionStatus::Complete),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(LoreError::validation(format!(
                "unknown session status '{other}' (expected in-progress, complete or abandoned)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    #[default]
    Planned,
    Active,
    Paused,
    Complete,
    Cancelled,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Planned => "PLANNED",
            PlanStatus::Active => "ACTIVE",
            PlanStatus::Paused => "PAUSED",
            PlanStatus::Complete => "COMPLETE",
            PlanStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = LoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLANNED" => Ok(PlanStatus::Planned),
            "ACTIVE" => Ok(PlanStatus::Active),
            "PAUSED" => Ok(PlanStatus::Paused),
            "COMPLETE" | "COMPLETED" => Ok(PlanStatus::Complete),
            "CANCELLED" | "CANCELED" => Ok(PlanStatus::Cancelled),
            other => Err(LoreError::validation(format!(
                "unknown plan status '{other}' (expected PLANNED, ACTIVE, PAUSED, COMPLETE or CANCELLED)"
            ))),
        }
    }
}

/// What an upsert did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Inserted => "inserted",
            UpsertOutcome::Updated => "updated",
            UpsertOutcome::Unchanged => "unchanged",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    Sessions,
    Plans,
    Patterns,
    #[default]
    All,
}

impl SearchScope {
    pub fn kinds(&self) -> &'static [ArtifactKind] {
        match self {
            SearchScope::Sessions => &[ArtifactKind::Session],
            SearchScope::Plans => &[ArtifactKind::Plan],
            SearchScope::Patterns => &[ArtifactKind::Pattern],
            SearchScope::All => &[ArtifactKind::Session, ArtifactKind::Plan, ArtifactKind::Pattern],
        }
    }
}

impl FromStr for SearchScope {
    type Err = LoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sessions" | "session" => Ok(SearchScope::Sessions),
            "plans" | "plan" => Ok(SearchScope::Plans),
            "patterns" | "pattern" | "learned" => Ok(SearchScope::Patterns),
            "all" | "" => Ok(SearchScope::All),
            other => Err(LoreError::validation(format!(
                "unknown search scope '{other}' (expected sessions, plans, patterns or all)"
            ))),
        }
    }
}

// ============================================
// RECORDS (write side)
// ============================================

/// Session as built from a file, ready to upsert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub id: String,
    pub project_id: String,
    pub date: NaiveDate,
    pub topic: String,
    pub topics: Vec<String>,
    pub status: SessionStatus,
    pub author: Option<String>,
    pub content: String,
    pub source_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRecord {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub status: PlanStatus,
    pub author: Option<String>,
    pub created: Option<NaiveDate>,
    pub topics: Vec<String>,
    pub content: String,
    pub source_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternRecord {
    /// Path under `learned/` without the `.md` extension, `/`-separated.
    pub id: String,
    pub project_id: String,
    pub category: String,
    pub title: String,
    pub keywords: Vec<String>,
    pub content: String,
    pub source_path: String,
}

/// One tracked source file, written after a successful upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationEntry {
    pub project_id: String,
    pub source_path: String,
    pub kind: ArtifactKind,
    pub entity_id: String,
    pub fingerprint: String,
}

// ============================================
// ROWS (read side)
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub root_path: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub project_id: String,
    pub date: NaiveDate,
    pub topic: String,
    pub topics: Vec<String>,
    pub status: SessionStatus,
    pub author: Option<String>,
    pub content: String,
    pub source_path: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub status: PlanStatus,
    pub author: Option<String>,
    pub created: Option<NaiveDate>,
    pub topics: Vec<String>,
    pub content: String,
    pub source_path: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedPattern {
    pub id: String,
    pub project_id: String,
    pub category: String,
    pub title: String,
    pub keywords: Vec<String>,
    pub content: String,
    pub source_path: String,
    pub created_at: String,
    pub updated_at: String,
}

// ============================================
// FILTERS
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFilter {
    pub project_id: Option<String>,
    pub status: Option<SessionStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Case-insensitive substring match against any topic.
    pub topic: Option<String>,
    pub author: Option<String>,
    pub page: Page,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanFilter {
    pub project_id: Option<String>,
    pub status: Option<PlanStatus>,
    /// Applied to the plan's `created` date; plans without one never match
    /// a date bound.
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub topic: Option<String>,
    pub author: Option<String>,
    pub page: Page,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternFilter {
    pub project_id: Option<String>,
    pub category: Option<String>,
    /// Case-insensitive substring match against any keyword.
    pub keyword: Option<String>,
    pub page: Page,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub scope: SearchScope,
    pub project_id: Option<String>,
    pub limit: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, scope: SearchScope) -> Self {
        Self {
            query: query.into(),
            scope,
            project_id: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

// ============================================
// RESULTS
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult<T> {
    /// Items in this page.
    pub count: usize,
    /// Matches before pagination.
    pub total: usize,
    pub items: Vec<T>,
}

impl<T> QueryResult<T> {
    pub fn new(items: Vec<T>, total: usize) -> Self {
        Self {
            count: items.len(),
            total,
            items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub kind: ArtifactKind,
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub snippet: String,
    /// Higher is better, in `[0, 1]`.
    pub relevance: f64,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub count: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub plans_indexed: usize,
    pub sessions_indexed: usize,
    pub patterns_indexed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub projects: usize,
    pub sessions: usize,
    pub plans: usize,
    pub patterns: usize,
    pub tracked_files: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_status_accepts_common_spellings() {
        assert_eq!("in-progress".parse::<SessionStatus>().unwrap(), SessionStatus::InProgress);
        assert_eq!("IN_PROGRESS".parse::<SessionStatus>().unwrap(), SessionStatus::InProgress);
        assert_eq!("Completed".parse::<SessionStatus>().unwrap(), SessionStatus::Complete);
        assert!("done".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn plan_status_is_case_insensitive() {
        assert_eq!("active".parse::<PlanStatus>().unwrap(), PlanStatus::Active);
        assert_eq!("Canceled".parse::<PlanStatus>().unwrap(), PlanStatus::Cancelled);
        assert!(matches!(
            "shipping".parse::<PlanStatus>(),
            Err(LoreError::Validation(_))
        ));
    }

    #[test]
    fn status_serde_matches_wire_names() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(serde_json::to_string(&PlanStatus::Cancelled).unwrap(), "\"CANCELLED\"");
    }

    #[test]
    fn scope_kinds() {
        assert_eq!(SearchScope::All.kinds().len(), 3);
        assert_eq!("learned".parse::<SearchScope>().unwrap(), SearchScope::Patterns);
        assert!("everything".parse::<SearchScope>().is_err());
    }

    #[test]
    fn query_result_counts_page_items() {
        let result = QueryResult::new(vec![1, 2], 10);
        assert_eq!(result.count, 2);
        assert_eq!(result.total, 10);
    }
}
