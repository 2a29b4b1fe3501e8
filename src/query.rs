//! Query engine: validates caller input and turns it into store filters
//!
//! Callers hand over raw strings (straight from CLI flags or tool calls).
//! Everything is checked here before the store is touched, so malformed
//! input surfaces as `LoreError::Validation` and never as a storage error.

use chrono::NaiveDate;

use crate::config::Config;
use crate::error::{LoreError, Result};
use crate::model::{
    LearnedPattern, Page, PatternFilter, Plan, PlanFilter, PlanStatus, QueryResult, SearchRequest,
    SearchResults, SearchScope, Session, SessionFilter, SessionStatus, DEFAULT_LIMIT, MAX_LIMIT,
};
use crate::store::StorageAdapter;

/// Raw session listing parameters
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub topic: Option<String>,
    pub author: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Raw plan listing parameters; dates bound the plan's `created` date
#[derive(Debug, Clone, Default)]
pub struct PlanQuery {
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub topic: Option<String>,
    pub author: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct PatternQuery {
    pub category: Option<String>,
    pub keyword: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub default_limit: usize,
    pub max_limit: usize,
    pub search_default_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            search_default_limit: 20,
        }
    }
}

impl From<&Config> for Limits {
    fn from(config: &Config) -> Self {
        Self {
            default_limit: config.query.default_limit,
            // The store caps at MAX_LIMIT regardless
            max_limit: config.query.max_limit.min(MAX_LIMIT),
            search_default_limit: config.search.default_limit,
        }
    }
}

pub struct QueryEngine<'a, S: StorageAdapter> {
    store: &'a S,
    project_id: Option<String>,
    limits: Limits,
}

impl<'a, S: StorageAdapter> QueryEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            project_id: None,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Restrict every query to one project.
    pub fn for_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn sessions(&self, query: &SessionQuery) -> Result<QueryResult<Session>> {
        let status = query
            .status
            .as_deref()
            .map(str::parse::<SessionStatus>)
            .transpose()?;
        let (date_from, date_to) =
            date_range(query.date_from.as_deref(), query.date_to.as_deref())?;

        self.store.query_sessions(&SessionFilter {
            project_id: self.project_id.clone(),
            status,
            date_from,
            date_to,
            topic: non_empty(&query.topic),
            author: non_empty(&query.author),
            page: self.page(query.limit, query.offset)?,
        })
    }

    pub fn plans(&self, query: &PlanQuery) -> Result<QueryResult<Plan>> {
        let status = query
            .status
            .as_deref()
            .map(str::parse::<PlanStatus>)
            .transpose()?;
        let (date_from, date_to) =
            date_range(query.date_from.as_deref(), query.date_to.as_deref())?;

        self.store.query_plans(&PlanFilter {
            project_id: self.project_id.clone(),
            status,
            date_from,
            date_to,
            topic: non_empty(&query.topic),
            author: non_empty(&query.author),
            page: self.page(query.limit, query.offset)?,
        })
    }

    pub fn patterns(&self, query: &PatternQuery) -> Result<QueryResult<LearnedPattern>> {
        self.store.query_patterns(&PatternFilter {
            project_id: self.project_id.clone(),
            category: non_empty(&query.category),
            keyword: non_empty(&query.keyword),
            page: self.page(query.limit, query.offset)?,
        })
    }

    /// Full-text search. `scope` accepts `sessions`, `plans`, `patterns`
    /// (or `learned`) and `all`.
    pub fn search(&self, query: &str, scope: &str, limit: Option<usize>) -> Result<SearchResults> {
        if query.trim().is_empty() {
            return Err(LoreError::validation("search query must not be empty"));
        }
        let scope: SearchScope = scope.parse()?;
        let limit = self.limit(limit, self.limits.search_default_limit)?;

        self.store.search(&SearchRequest {
            query: query.to_string(),
            scope,
            project_id: self.project_id.clone(),
            limit,
        })
    }

    pub fn session(&self, id: &str) -> Result<Session> {
        self.store.get_session(self.require_project()?, id)
    }

    pub fn plan(&self, id: &str) -> Result<Plan> {
        self.store.get_plan(self.require_project()?, id)
    }

    pub fn pattern(&self, id: &str) -> Result<LearnedPattern> {
        self.store.get_pattern(self.require_project()?, id)
    }

    fn require_project(&self) -> Result<&str> {
        self.project_id
            .as_deref()
            .ok_or_else(|| LoreError::validation("a project is required to look up by id"))
    }

    fn page(&self, limit: Option<usize>, offset: Option<usize>) -> Result<Page> {
        let offset = offset.unwrap_or(0);
        if i64::try_from(offset).is_err() {
            return Err(LoreError::validation(format!("offset {offset} is too large")));
        }
        Ok(Page {
            limit: self.limit(limit, self.limits.default_limit)?,
            offset,
        })
    }

    fn limit(&self, requested: Option<usize>, default: usize) -> Result<usize> {
        match requested {
            Some(0) => Err(LoreError::validation("limit must be a positive integer")),
            Some(n) => Ok(n.min(self.limits.max_limit)),
            None => Ok(default.min(self.limits.max_limit)),
        }
    }
}

/// Parse a `YYYY-MM-DD` date for the named field.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        LoreError::validation(format!("{field}: '{raw}' is not a YYYY-MM-DD date"))
    })
}

fn date_range(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
    let from = from.map(|raw| parse_date("from", raw)).transpose()?;
    let to = to.map(|raw| parse_date("to", raw)).transpose()?;

    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(LoreError::validation(format!(
                "date range is inverted: {from} is after {to}"
            )));
        }
    }

    Ok((from, to))
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PatternRecord, PlanRecord, SessionRecord};
    use crate::store::SqliteStore;
    use std::path::Path;

    fn seeded() -> (SqliteStore, String) {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.ensure_project(Path::new("/work/app")).unwrap();

        for (id, date, status, topic) in [
            ("s1", "2026-02-01", SessionStatus::Complete, "testing"),
            ("s2", "2026-02-10", SessionStatus::InProgress, "migration"),
            ("s3", "2026-03-01", SessionStatus::Complete, "migration"),
        ] {
            store
                .upsert_session(&SessionRecord {
                    id: id.to_string(),
                    project_id: project.id.clone(),
                    date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                    topic: topic.to_string(),
                    topics: vec![topic.to_string()],
                    status,
                    author: None,
                    content: format!("{id} body"),
                    source_path: format!("sessions/{id}.md"),
                })
                .unwrap();
        }

        store
            .upsert_plan(&PlanRecord {
                id: "mcp_migration".to_string(),
                project_id: project.id.clone(),
                title: "MCP migration".to_string(),
                status: PlanStatus::Active,
                author: None,
                created: None,
                topics: vec![],
                content: "Move tools over".to_string(),
                source_path: "PLAN_mcp_migration.md".to_string(),
            })
            .unwrap();

        store
            .upsert_pattern(&PatternRecord {
                id: "db/retries".to_string(),
                project_id: project.id.clone(),
                category: "db".to_string(),
                title: "Retries".to_string(),
                keywords: vec!["retry".to_string()],
                content: "When migration errors happen, retry.".to_string(),
                source_path: "learned/db/retries.md".to_string(),
            })
            .unwrap();

        (store, project.id)
    }

    #[test]
    fn malformed_date_is_validation_error() {
        let (store, _) = seeded();
        let engine = QueryEngine::new(&store);
        let err = engine
            .sessions(&SessionQuery {
                date_from: Some("02/12/2026".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, LoreError::Validation(_)));
    }

    #[test]
    fn inverted_range_is_validation_error() {
        let (store, _) = seeded();
        let err = QueryEngine::new(&store)
            .plans(&PlanQuery {
                date_from: Some("2026-03-01".to_string()),
                date_to: Some("2026-02-01".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, LoreError::Validation(_)));
    }

    #[test]
    fn oversized_offset_is_validation_error() {
        let (store, _) = seeded();
        let engine = QueryEngine::new(&store);
        let err = engine
            .sessions(&SessionQuery {
                offset: Some(usize::MAX),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, LoreError::Validation(_)));

        let err = engine
            .patterns(&PatternQuery {
                offset: Some(i64::MAX as usize + 1),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, LoreError::Validation(_)));

        // The largest representable offset is simply past the end
        let page = engine
            .sessions(&SessionQuery {
                offset: Some(i64::MAX as usize),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.count, 0);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn unknown_status_is_validation_error() {
        let (store, _) = seeded();
        let engine = QueryEngine::new(&store);
        let err = engine
            .sessions(&SessionQuery {
                status: Some("finished".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, LoreError::Validation(_)));

        let err = engine
            .plans(&PlanQuery {
                status: Some("DONE".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, LoreError::Validation(_)));
    }

    #[test]
    fn zero_limit_rejected_and_large_limit_clamped() {
        let (store, _) = seeded();
        let engine = QueryEngine::new(&store).with_limits(Limits {
            max_limit: 2,
            ..Limits::default()
        });

        let err = engine
            .sessions(&SessionQuery {
                limit: Some(0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, LoreError::Validation(_)));

        let page = engine
            .sessions(&SessionQuery {
                limit: Some(10_000),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn filters_combine() {
        let (store, project_id) = seeded();
        let engine = QueryEngine::new(&store).for_project(project_id);

        let result = engine
            .sessions(&SessionQuery {
                status: Some("complete".to_string()),
                topic: Some("MIGRATION".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.count, 1);
        assert_eq!(result.items[0].id, "s3");

        let in_range = engine
            .sessions(&SessionQuery {
                date_from: Some("2026-02-01".to_string()),
                date_to: Some("2026-02-10".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(in_range.total, 2);
    }

    #[test]
    fn blank_filters_are_ignored() {
        let (store, _) = seeded();
        let result = QueryEngine::new(&store)
            .sessions(&SessionQuery {
                topic: Some("   ".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.total, 3);
    }

    #[test]
    fn search_validates_input() {
        let (store, _) = seeded();
        let engine = QueryEngine::new(&store);

        assert!(matches!(
            engine.search("  ", "all", None).unwrap_err(),
            LoreError::Validation(_)
        ));
        assert!(matches!(
            engine.search("migration", "everything", None).unwrap_err(),
            LoreError::Validation(_)
        ));
        assert!(matches!(
            engine.search("migration", "all", Some(0)).unwrap_err(),
            LoreError::Validation(_)
        ));

        let results = engine.search("migration errors", "patterns", None).unwrap();
        assert_eq!(results.count, 1);
        assert_eq!(results.results[0].id, "db/retries");
    }

    #[test]
    fn other_project_sees_nothing() {
        let (store, _) = seeded();
        let other = store.ensure_project(Path::new("/work/other")).unwrap();
        let engine = QueryEngine::new(&store).for_project(other.id);

        assert_eq!(engine.sessions(&SessionQuery::default()).unwrap().total, 0);
        assert_eq!(engine.patterns(&PatternQuery::default()).unwrap().total, 0);
        assert_eq!(engine.search("migration", "all", None).unwrap().count, 0);
    }

    #[test]
    fn lookup_by_id_needs_project() {
        let (store, project_id) = seeded();

        let unscoped = QueryEngine::new(&store);
        assert!(matches!(
            unscoped.plan("mcp_migration").unwrap_err(),
            LoreError::Validation(_)
        ));

        let scoped = QueryEngine::new(&store).for_project(project_id);
        assert_eq!(scoped.plan("mcp_migration").unwrap().title, "MCP migration");
        assert!(matches!(
            scoped.pattern("missing").unwrap_err(),
            LoreError::NotFound(_)
        ));
    }
}
