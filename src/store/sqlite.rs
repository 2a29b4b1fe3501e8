//! SQLite-backed `StorageAdapter`

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDate, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::schema::{SCHEMA_V1, SCHEMA_VERSION};
use super::search::{self, IndexEntry};
use super::{StorageAdapter, StoreLocator};
use crate::error::{LoreError, Result};
use crate::model::{
    ArtifactKind, IndexStats, LearnedPattern, MigrationEntry, Page, PatternFilter, PatternRecord,
    Plan, PlanFilter, PlanRecord, Project, QueryResult, SearchRequest, SearchResults, Session,
    SessionFilter, SessionRecord, StoreStats, UpsertOutcome, DEFAULT_LIMIT, MAX_LIMIT,
};

const SESSION_COLUMNS: &str = "s.id, s.project_id, s.date, s.topic, s.topics, s.status, s.author,
     s.content, s.source_path, s.created_at, s.updated_at";

const PLAN_COLUMNS: &str = "p.id, p.project_id, p.title, p.status, p.author, p.created, p.topics,
     p.content, p.source_path, p.created_at, p.updated_at";

const PATTERN_COLUMNS: &str = "l.id, l.project_id, l.category, l.title, l.keywords, l.content,
     l.source_path, l.created_at, l.updated_at";

const PROJECT_COLUMNS: &str = "id, name, root_path, created_at";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Option<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::init(&StoreLocator::file(path))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(&StoreLocator::InMemory)
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(LoreError::StorageClosed)
    }

    fn connect(locator: &StoreLocator) -> rusqlite::Result<Connection> {
        match locator {
            StoreLocator::File(path) => Connection::open(path),
            StoreLocator::InMemory => Connection::open_in_memory(),
        }
    }

    fn configure(conn: &Connection) -> rusqlite::Result<()> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        // In-memory databases report "memory" and keep it
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        Ok(())
    }

    /// Bring the schema up to `SCHEMA_VERSION`, one step at a time.
    fn migrate_schema(conn: &Connection) -> Result<()> {
        let current: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        if current > SCHEMA_VERSION {
            return Err(LoreError::StorageInit(format!(
                "database schema version {current} is newer than supported version {SCHEMA_VERSION}"
            )));
        }
        if current == SCHEMA_VERSION {
            tracing::debug!("Database schema version: {}", current);
            return Ok(());
        }

        tracing::info!(
            "Database schema version: {} (target: {})",
            current,
            SCHEMA_VERSION
        );

        let tx = conn.unchecked_transaction()?;
        if current < 1 {
            tracing::info!("Running schema migration v1: initial schema");
            tx.execute_batch(SCHEMA_V1)?;
        }
        tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        tx.commit()?;
        Ok(())
    }
}

impl StorageAdapter for SqliteStore {
    fn init(locator: &StoreLocator) -> Result<Self> {
        if let StoreLocator::File(path) = locator {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    LoreError::StorageInit(format!("cannot create {}: {e}", parent.display()))
                })?;
            }
        }

        let conn = Self::connect(locator)
            .and_then(|conn| Self::configure(&conn).map(|()| conn))
            .map_err(|e| LoreError::StorageInit(format!("cannot open database: {e}")))?;

        Self::migrate_schema(&conn).map_err(|e| match e {
            LoreError::StorageInit(_) => e,
            other => LoreError::StorageInit(format!("cannot initialize schema: {other}")),
        })?;

        Ok(Self { conn: Some(conn) })
    }

    // ============================================
    // PROJECTS
    // ============================================

    fn ensure_project(&self, root_path: &Path) -> Result<Project> {
        if let Some(project) = self.find_project_by_path(root_path)? {
            return Ok(project);
        }

        let conn = self.conn()?;
        let root = root_path.to_string_lossy().to_string();
        let name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.clone());
        let project = Project {
            id: Uuid::new_v4().to_string(),
            name,
            root_path: root,
            created_at: now(),
        };

        conn.execute(
            "INSERT INTO projects (id, name, root_path, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![project.id, project.name, project.root_path, project.created_at],
        )?;
        tracing::info!("Registered project '{}' at {}", project.name, project.root_path);
        Ok(project)
    }

    fn find_project_by_path(&self, root_path: &Path) -> Result<Option<Project>> {
        let conn = self.conn()?;
        let project = conn
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE root_path = ?1"),
                params![root_path.to_string_lossy().to_string()],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY name, id"))?;
        let rows = stmt.query_map([], project_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    fn move_project(&self, project_id: &str, new_root: &Path) -> Result<Project> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE projects SET root_path = ?1 WHERE id = ?2",
            params![new_root.to_string_lossy().to_string(), project_id],
        )?;
        if changed == 0 {
            return Err(LoreError::NotFound(format!("project {project_id}")));
        }

        let project = conn.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            params![project_id],
            project_from_row,
        )?;
        Ok(project)
    }

    // ============================================
    // UPSERTS
    // ============================================

    fn upsert_session(&self, record: &SessionRecord) -> Result<UpsertOutcome> {
        let conn = self.conn()?;
        let hash = record_hash(record)?;
        let tx = conn.unchecked_transaction()?;

        let outcome = match existing_hash(&tx, "sessions", &record.project_id, &record.id)? {
            Some(existing) if existing == hash => return Ok(UpsertOutcome::Unchanged),
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        };

        let now = now();
        tx.execute(
            r#"INSERT INTO sessions
               (project_id, id, date, topic, topics, status, author, content, source_path,
                record_hash, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
               ON CONFLICT(project_id, id) DO UPDATE SET
                   date = excluded.date,
                   topic = excluded.topic,
                   topics = excluded.topics,
                   status = excluded.status,
                   author = excluded.author,
                   content = excluded.content,
                   source_path = excluded.source_path,
                   record_hash = excluded.record_hash,
                   updated_at = excluded.updated_at"#,
            params![
                record.project_id,
                record.id,
                record.date.to_string(),
                record.topic,
                serde_json::to_string(&record.topics)?,
                record.status.as_str(),
                record.author,
                record.content,
                record.source_path,
                hash,
                now,
            ],
        )?;

        replace_topics(&tx, &record.project_id, ArtifactKind::Session, &record.id, &record.topics)?;
        search::index_entry(
            &tx,
            &IndexEntry::session(
                &record.project_id,
                &record.id,
                &record.topic,
                &record.topics,
                record.author.as_deref(),
                &record.content,
                &now,
            ),
        )?;

        tx.commit()?;
        Ok(outcome)
    }

    fn upsert_plan(&self, record: &PlanRecord) -> Result<UpsertOutcome> {
        let conn = self.conn()?;
        let hash = record_hash(record)?;
        let tx = conn.unchecked_transaction()?;

        let outcome = match existing_hash(&tx, "plans", &record.project_id, &record.id)? {
            Some(existing) if existing == hash => return Ok(UpsertOutcome::Unchanged),
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        };

        let now = now();
        tx.execute(
            r#"INSERT INTO plans
               (project_id, id, title, status, author, created, topics, content, source_path,
                record_hash, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
               ON CONFLICT(project_id, id) DO UPDATE SET
                   title = excluded.title,
                   status = excluded.status,
                   author = excluded.author,
                   created = excluded.created,
                   topics = excluded.topics,
                   content = excluded.content,
                   source_path = excluded.source_path,
                   record_hash = excluded.record_hash,
                   updated_at = excluded.updated_at"#,
            params![
                record.project_id,
                record.id,
                record.title,
                record.status.as_str(),
                record.author,
                record.created.map(|d| d.to_string()),
                serde_json::to_string(&record.topics)?,
                record.content,
                record.source_path,
                hash,
                now,
            ],
        )?;

        replace_topics(&tx, &record.project_id, ArtifactKind::Plan, &record.id, &record.topics)?;
        search::index_entry(
            &tx,
            &IndexEntry::plan(
                &record.project_id,
                &record.id,
                &record.title,
                &record.topics,
                record.author.as_deref(),
                &record.content,
                &now,
            ),
        )?;

        tx.commit()?;
        Ok(outcome)
    }

    fn upsert_pattern(&self, record: &PatternRecord) -> Result<UpsertOutcome> {
        let conn = self.conn()?;
        let hash = record_hash(record)?;
        let tx = conn.unchecked_transaction()?;

        let outcome = match existing_hash(&tx, "learned_patterns", &record.project_id, &record.id)? {
            Some(existing) if existing == hash => return Ok(UpsertOutcome::Unchanged),
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        };

        let now = now();
        tx.execute(
            r#"INSERT INTO learned_patterns
               (project_id, id, category, title, keywords, content, source_path,
                record_hash, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
               ON CONFLICT(project_id, id) DO UPDATE SET
                   category = excluded.category,
                   title = excluded.title,
                   keywords = excluded.keywords,
                   content = excluded.content,
                   source_path = excluded.source_path,
                   record_hash = excluded.record_hash,
                   updated_at = excluded.updated_at"#,
            params![
                record.project_id,
                record.id,
                record.category,
                record.title,
                serde_json::to_string(&record.keywords)?,
                record.content,
                record.source_path,
                hash,
                now,
            ],
        )?;

        replace_topics(&tx, &record.project_id, ArtifactKind::Pattern, &record.id, &record.keywords)?;
        search::index_entry(
            &tx,
            &IndexEntry::pattern(
                &record.project_id,
                &record.id,
                &record.title,
                &record.category,
                &record.keywords,
                &record.content,
                &now,
            ),
        )?;

        tx.commit()?;
        Ok(outcome)
    }

    // ============================================
    // MIGRATION TRACKING
    // ============================================

    fn migration_fingerprint(
        &self,
        project_id: &str,
        source_path: &str,
    ) -> Result<Option<String>> {
        let conn = self.conn()?;
        let fingerprint = conn
            .query_row(
                "SELECT fingerprint FROM migrated_files WHERE project_id = ?1 AND source_path = ?2",
                params![project_id, source_path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(fingerprint)
    }

    fn record_migration(&self, entry: &MigrationEntry) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"INSERT INTO migrated_files
               (project_id, source_path, kind, entity_id, fingerprint, migrated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(project_id, source_path) DO UPDATE SET
                   kind = excluded.kind,
                   entity_id = excluded.entity_id,
                   fingerprint = excluded.fingerprint,
                   migrated_at = excluded.migrated_at"#,
            params![
                entry.project_id,
                entry.source_path,
                entry.kind.as_str(),
                entry.entity_id,
                entry.fingerprint,
                now(),
            ],
        )?;
        Ok(())
    }

    // ============================================
    // QUERIES
    // ============================================

    fn query_sessions(&self, filter: &SessionFilter) -> Result<QueryResult<Session>> {
        let conn = self.conn()?;
        let mut conditions = Conditions::default();

        if let Some(project_id) = &filter.project_id {
            conditions.push("s.project_id = ?", [text(project_id)]);
        }
        if let Some(status) = filter.status {
            conditions.push("s.status = ?", [text(status.as_str())]);
        }
        if let Some(from) = filter.date_from {
            conditions.push("s.date >= ?", [text(&from.to_string())]);
        }
        if let Some(to) = filter.date_to {
            conditions.push("s.date <= ?", [text(&to.to_string())]);
        }
        if let Some(topic) = filter.topic.as_deref().map(str::to_lowercase) {
            conditions.push(
                "(instr(lower(s.topic), ?) > 0 OR EXISTS (
                    SELECT 1 FROM artifact_topics t
                    WHERE t.project_id = s.project_id AND t.kind = 'session'
                      AND t.item_id = s.id AND instr(t.topic, ?) > 0))",
                [text(&topic), text(&topic)],
            );
        }
        if let Some(author) = &filter.author {
            conditions.push("lower(s.author) = lower(?)", [text(author)]);
        }

        paged(
            conn,
            SESSION_COLUMNS,
            "FROM sessions s",
            &conditions,
            "s.date DESC, s.updated_at DESC, s.project_id ASC, s.id ASC",
            filter.page,
            session_from_row,
        )
    }

    fn query_plans(&self, filter: &PlanFilter) -> Result<QueryResult<Plan>> {
        let conn = self.conn()?;
        let mut conditions = Conditions::default();

        if let Some(project_id) = &filter.project_id {
            conditions.push("p.project_id = ?", [text(project_id)]);
        }
        if let Some(status) = filter.status {
            conditions.push("p.status = ?", [text(status.as_str())]);
        }
        if let Some(from) = filter.date_from {
            conditions.push("p.created >= ?", [text(&from.to_string())]);
        }
        if let Some(to) = filter.date_to {
            conditions.push("p.created <= ?", [text(&to.to_string())]);
        }
        if let Some(topic) = filter.topic.as_deref().map(str::to_lowercase) {
            conditions.push(
                "EXISTS (
                    SELECT 1 FROM artifact_topics t
                    WHERE t.project_id = p.project_id AND t.kind = 'plan'
                      AND t.item_id = p.id AND instr(t.topic, ?) > 0)",
                [text(&topic)],
            );
        }
        if let Some(author) = &filter.author {
            conditions.push("lower(p.author) = lower(?)", [text(author)]);
        }

        paged(
            conn,
            PLAN_COLUMNS,
            "FROM plans p",
            &conditions,
            "p.updated_at DESC, p.project_id ASC, p.id ASC",
            filter.page,
            plan_from_row,
        )
    }

    fn query_patterns(&self, filter: &PatternFilter) -> Result<QueryResult<LearnedPattern>> {
        let conn = self.conn()?;
        let mut conditions = Conditions::default();

        if let Some(project_id) = &filter.project_id {
            conditions.push("l.project_id = ?", [text(project_id)]);
        }
        if let Some(category) = &filter.category {
            conditions.push("lower(l.category) = lower(?)", [text(category)]);
        }
        if let Some(keyword) = filter.keyword.as_deref().map(str::to_lowercase) {
            conditions.push(
                "EXISTS (
                    SELECT 1 FROM artifact_topics t
                    WHERE t.project_id = l.project_id AND t.kind = 'pattern'
                      AND t.item_id = l.id AND instr(t.topic, ?) > 0)",
                [text(&keyword)],
            );
        }

        paged(
            conn,
            PATTERN_COLUMNS,
            "FROM learned_patterns l",
            &conditions,
            "l.updated_at DESC, l.project_id ASC, l.id ASC",
            filter.page,
            pattern_from_row,
        )
    }

    fn get_session(&self, project_id: &str, id: &str) -> Result<Session> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions s WHERE s.project_id = ?1 AND s.id = ?2"),
            params![project_id, id],
            session_from_row,
        )
        .optional()?
        .ok_or_else(|| LoreError::NotFound(format!("session {id}")))
    }

    fn get_plan(&self, project_id: &str, id: &str) -> Result<Plan> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {PLAN_COLUMNS} FROM plans p WHERE p.project_id = ?1 AND p.id = ?2"),
            params![project_id, id],
            plan_from_row,
        )
        .optional()?
        .ok_or_else(|| LoreError::NotFound(format!("plan {id}")))
    }

    fn get_pattern(&self, project_id: &str, id: &str) -> Result<LearnedPattern> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {PATTERN_COLUMNS} FROM learned_patterns l WHERE l.project_id = ?1 AND l.id = ?2"
            ),
            params![project_id, id],
            pattern_from_row,
        )
        .optional()?
        .ok_or_else(|| LoreError::NotFound(format!("learned pattern {id}")))
    }

    fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        search::search(self.conn()?, request)
    }

    fn rebuild_index(&self) -> Result<IndexStats> {
        search::rebuild_index(self.conn()?)
    }

    fn stats(&self, project_id: Option<&str>) -> Result<StoreStats> {
        let conn = self.conn()?;
        let count = |table: &str, column: &str| -> Result<usize> {
            let n: i64 = match project_id {
                Some(pid) => conn.query_row(
                    &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1"),
                    params![pid],
                    |row| row.get(0),
                )?,
                None => conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?,
            };
            Ok(n as usize)
        };

        Ok(StoreStats {
            projects: count("projects", "id")?,
            sessions: count("sessions", "project_id")?,
            plans: count("plans", "project_id")?,
            patterns: count("learned_patterns", "project_id")?,
            tracked_files: count("migrated_files", "project_id")?,
        })
    }

    fn close(&mut self) -> Result<()> {
        let conn = self.conn.take().ok_or(LoreError::StorageClosed)?;
        conn.close().map_err(|(_, e)| LoreError::Database(e))
    }
}

// ============================================
// HELPERS
// ============================================

/// WHERE clause fragments with their positional parameters, in order.
#[derive(Default)]
struct Conditions {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl Conditions {
    fn push(&mut self, clause: &str, values: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause.to_string());
        self.values.extend(values);
    }

    fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn paged<T>(
    conn: &Connection,
    columns: &str,
    from: &str,
    conditions: &Conditions,
    order_by: &str,
    page: Page,
    map_row: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<QueryResult<T>> {
    let limit = match page.limit {
        0 => DEFAULT_LIMIT,
        n => n.min(MAX_LIMIT),
    };
    // SQLite reads a negative OFFSET as 0, so a wrapped value would
    // silently return the first page
    let offset = i64::try_from(page.offset)
        .map_err(|_| LoreError::validation(format!("offset {} is too large", page.offset)))?;
    let where_sql = conditions.sql();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) {from}{where_sql}"),
        params_from_iter(conditions.values.iter()),
        |row| row.get(0),
    )?;

    let mut values = conditions.values.clone();
    values.push(Value::Integer(limit as i64));
    values.push(Value::Integer(offset));

    let mut stmt = conn.prepare(&format!(
        "SELECT {columns} {from}{where_sql} ORDER BY {order_by} LIMIT ? OFFSET ?"
    ))?;
    let items = stmt
        .query_map(params_from_iter(values.iter()), map_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(QueryResult::new(items, total as usize))
}

fn existing_hash(
    conn: &Connection,
    table: &str,
    project_id: &str,
    id: &str,
) -> Result<Option<String>> {
    let hash = conn
        .query_row(
            &format!("SELECT record_hash FROM {table} WHERE project_id = ?1 AND id = ?2"),
            params![project_id, id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(hash)
}

fn replace_topics(
    conn: &Connection,
    project_id: &str,
    kind: ArtifactKind,
    item_id: &str,
    topics: &[String],
) -> Result<()> {
    conn.execute(
        "DELETE FROM artifact_topics WHERE project_id = ?1 AND kind = ?2 AND item_id = ?3",
        params![project_id, kind.as_str(), item_id],
    )?;

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO artifact_topics (project_id, kind, item_id, topic)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for topic in topics {
        stmt.execute(params![project_id, kind.as_str(), item_id, topic.to_lowercase()])?;
    }
    Ok(())
}

/// SHA-256 over the serialized record; equal hashes mean an upsert would
/// not change the row.
fn record_hash<T: Serialize>(record: &T) -> Result<String> {
    let bytes = serde_json::to_vec(record)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

pub(super) fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================
// ROW MAPPING
// ============================================

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| s.parse::<NaiveDate>())
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn json_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        root_path: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        project_id: row.get(1)?,
        date: parse_column(row, 2)?,
        topic: row.get(3)?,
        topics: json_list(row, 4)?,
        status: parse_column(row, 5)?,
        author: row.get(6)?,
        content: row.get(7)?,
        source_path: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn plan_from_row(row: &Row<'_>) -> rusqlite::Result<Plan> {
    Ok(Plan {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        status: parse_column(row, 3)?,
        author: row.get(4)?,
        created: optional_date(row, 5)?,
        topics: json_list(row, 6)?,
        content: row.get(7)?,
        source_path: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn pattern_from_row(row: &Row<'_>) -> rusqlite::Result<LearnedPattern> {
    Ok(LearnedPattern {
        id: row.get(0)?,
        project_id: row.get(1)?,
        category: row.get(2)?,
        title: row.get(3)?,
        keywords: json_list(row, 4)?,
        content: row.get(5)?,
        source_path: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
