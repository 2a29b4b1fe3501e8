//! Storage adapter boundary and its SQLite implementation
//!
//! The migration coordinator and query engine only talk to
//! [`StorageAdapter`]; `SqliteStore` is the embedded backend.

mod schema;
mod search;
mod sqlite;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::{
    IndexStats, LearnedPattern, MigrationEntry, PatternFilter, PatternRecord, Plan, PlanFilter,
    PlanRecord, Project, QueryResult, SearchRequest, SearchResults, Session, SessionFilter,
    SessionRecord, StoreStats, UpsertOutcome,
};

pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteStore;

/// Where a store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocator {
    File(PathBuf),
    InMemory,
}

impl StoreLocator {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        StoreLocator::File(path.into())
    }
}

/// Embedded, transactional knowledge store.
///
/// Every mutating call runs in its own transaction: a failure leaves the
/// affected row either fully old or fully new. Once `close` has been
/// called every method returns `LoreError::StorageClosed`.
pub trait StorageAdapter {
    /// Open or create the store, creating or migrating the schema.
    fn init(locator: &StoreLocator) -> Result<Self>
    where
        Self: Sized;

    // ============================================
    // PROJECTS
    // ============================================

    /// Find the project rooted at `root_path`, registering it if new.
    fn ensure_project(&self, root_path: &Path) -> Result<Project>;

    fn find_project_by_path(&self, root_path: &Path) -> Result<Option<Project>>;

    fn list_projects(&self) -> Result<Vec<Project>>;

    /// Point an existing project at a new root directory.
    fn move_project(&self, project_id: &str, new_root: &Path) -> Result<Project>;

    // ============================================
    // UPSERTS
    // ============================================

    fn upsert_session(&self, record: &SessionRecord) -> Result<UpsertOutcome>;

    fn upsert_plan(&self, record: &PlanRecord) -> Result<UpsertOutcome>;

    fn upsert_pattern(&self, record: &PatternRecord) -> Result<UpsertOutcome>;

    // ============================================
    // MIGRATION TRACKING
    // ============================================

    /// Fingerprint stored by the last successful migration of this file.
    fn migration_fingerprint(&self, project_id: &str, source_path: &str)
        -> Result<Option<String>>;

    fn record_migration(&self, entry: &MigrationEntry) -> Result<()>;

    // ============================================
    // QUERIES
    // ============================================

    /// Newest first: `date` descending, then `updated_at`, then id.
    fn query_sessions(&self, filter: &SessionFilter) -> Result<QueryResult<Session>>;

    /// Most recently updated first, then id.
    fn query_plans(&self, filter: &PlanFilter) -> Result<QueryResult<Plan>>;

    fn query_patterns(&self, filter: &PatternFilter) -> Result<QueryResult<LearnedPattern>>;

    fn get_session(&self, project_id: &str, id: &str) -> Result<Session>;

    fn get_plan(&self, project_id: &str, id: &str) -> Result<Plan>;

    fn get_pattern(&self, project_id: &str, id: &str) -> Result<LearnedPattern>;

    /// Keyword search over content and metadata. Ties in relevance are
    /// broken by `updated_at` descending, then kind, then id.
    fn search(&self, request: &SearchRequest) -> Result<SearchResults>;

    /// Recompute the search index from the canonical tables.
    fn rebuild_index(&self) -> Result<IndexStats>;

    fn stats(&self, project_id: Option<&str>) -> Result<StoreStats>;

    fn close(&mut self) -> Result<()>;
}
