//! SQLite schema definition
//!
//! One table per knowledge entity, a topic join table used for filtering,
//! the migration-tracking table and a standalone FTS5 index that is derived
//! entirely from the canonical rows (see `rebuild_index`).

/// Stored in `PRAGMA user_version`. Bump together with a new step in
/// `SqliteStore::migrate_schema`.
pub const SCHEMA_VERSION: i32 = 1;

pub const SCHEMA_V1: &str = r#"
-- ============================================
-- PROJECTS
-- ============================================

CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,                   -- UUID
    name TEXT NOT NULL,                    -- Directory basename
    root_path TEXT NOT NULL UNIQUE,        -- Absolute project root
    created_at TEXT NOT NULL
);

-- ============================================
-- KNOWLEDGE ARTIFACTS
-- ============================================

-- Identity: (project_id, id); id comes from the file name
CREATE TABLE IF NOT EXISTS sessions (
    project_id TEXT NOT NULL,
    id TEXT NOT NULL,
    date TEXT NOT NULL,                    -- YYYY-MM-DD
    topic TEXT NOT NULL,
    topics TEXT NOT NULL DEFAULT '[]',     -- JSON array, mirrored in artifact_topics
    status TEXT NOT NULL,                  -- 'in-progress', 'complete', 'abandoned'
    author TEXT,
    content TEXT NOT NULL,                 -- Body verbatim
    source_path TEXT NOT NULL,             -- Relative to the knowledge dir
    record_hash TEXT NOT NULL,             -- Detects content-identical upserts
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (project_id, id),
    FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE
);

-- Identity: (project_id, id); id is the suffix of PLAN_<id>.md
CREATE TABLE IF NOT EXISTS plans (
    project_id TEXT NOT NULL,
    id TEXT NOT NULL,
    title TEXT NOT NULL,
    status TEXT NOT NULL,                  -- 'PLANNED', 'ACTIVE', 'PAUSED', 'COMPLETE', 'CANCELLED'
    author TEXT,
    created TEXT,                          -- Front-matter date, if any
    topics TEXT NOT NULL DEFAULT '[]',
    content TEXT NOT NULL,
    source_path TEXT NOT NULL,
    record_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (project_id, id),
    FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE
);

-- Identity: (project_id, id); id is the path under learned/ without .md
CREATE TABLE IF NOT EXISTS learned_patterns (
    project_id TEXT NOT NULL,
    id TEXT NOT NULL,
    category TEXT NOT NULL,
    title TEXT NOT NULL,
    keywords TEXT NOT NULL DEFAULT '[]',
    content TEXT NOT NULL,
    source_path TEXT NOT NULL,
    record_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (project_id, id),
    FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE
);

-- Topics (sessions, plans) and keywords (patterns), one row per value
CREATE TABLE IF NOT EXISTS artifact_topics (
    project_id TEXT NOT NULL,
    kind TEXT NOT NULL,                    -- 'session', 'plan', 'pattern'
    item_id TEXT NOT NULL,
    topic TEXT NOT NULL,                   -- Lowercased
    PRIMARY KEY (project_id, kind, item_id, topic)
);

-- ============================================
-- MIGRATION TRACKING
-- ============================================

CREATE TABLE IF NOT EXISTS migrated_files (
    project_id TEXT NOT NULL,
    source_path TEXT NOT NULL,             -- Relative to the knowledge dir
    kind TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    fingerprint TEXT NOT NULL,             -- SHA-256 of the file bytes
    migrated_at TEXT NOT NULL,
    PRIMARY KEY (project_id, source_path),
    FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE
);

-- ============================================
-- SEARCH INDEX (derived)
-- ============================================

CREATE VIRTUAL TABLE IF NOT EXISTS knowledge_fts USING fts5(
    kind UNINDEXED,
    item_id UNINDEXED,
    project_id UNINDEXED,
    updated_at UNINDEXED,
    title,
    tags,
    content,
    tokenize = 'unicode61 remove_diacritics 2'
);

-- ============================================
-- INDEXES
-- ============================================

CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(project_id, date DESC);
CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status);
CREATE INDEX IF NOT EXISTS idx_plans_status ON plans(status);
CREATE INDEX IF NOT EXISTS idx_plans_updated ON plans(project_id, updated_at DESC);
CREATE INDEX IF NOT EXISTS idx_patterns_category ON learned_patterns(project_id, category);
CREATE INDEX IF NOT EXISTS idx_topics_topic ON artifact_topics(kind, topic);
"#;
