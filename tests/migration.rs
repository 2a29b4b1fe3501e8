//! End-to-end migration and query behaviour on real directories

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use lorekeep::config::KnowledgeConfig;
use lorekeep::model::{ArtifactKind, PatternFilter, PlanFilter, SessionFilter};
use lorekeep::query::{QueryEngine, SessionQuery};
use lorekeep::store::{SqliteStore, StorageAdapter, StoreLocator};
use lorekeep::{migrate_from_directory, LoreError};

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(".lore").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn store(&self) -> SqliteStore {
        SqliteStore::open(&self.dir.path().join("db").join("lore.db")).unwrap()
    }
}

fn migrate(store: &SqliteStore, root: &Path) -> lorekeep::MigrationResult {
    migrate_from_directory(store, &KnowledgeConfig::default(), root).unwrap()
}

const SESSION: &str = "---\ndate: 2026-02-12\nstatus: complete\ntopics:\n  - testing\n  - migration\n---\nTest session content";

#[test]
fn round_trip_session() {
    let fx = Fixture::new();
    fx.write("sessions/2026-02-12-notes.md", SESSION);
    let store = fx.store();

    let result = migrate(&store, fx.root());
    assert_eq!(result.sessions_migrated, 1);

    let sessions = store.query_sessions(&SessionFilter::default()).unwrap();
    assert_eq!(sessions.count, 1);
    let session = &sessions.items[0];
    assert_eq!(session.date.to_string(), "2026-02-12");
    assert!(session.topics.contains(&"testing".to_string()));
    assert!(session.topics.contains(&"migration".to_string()));

    let full = store.get_session(&session.project_id, &session.id).unwrap();
    assert_eq!(full.content, "Test session content");
}

#[test]
fn rerun_on_unchanged_directory_is_idempotent() {
    let fx = Fixture::new();
    fx.write("sessions/a.md", SESSION);
    fx.write("PLAN_alpha.md", "---\nstatus: ACTIVE\n---\n# Alpha\n");
    fx.write("learned/db/retries.md", "Retry on busy.\n");
    let store = fx.store();

    let first = migrate(&store, fx.root());
    assert_eq!(first.migrated(), 3);

    let second = migrate(&store, fx.root());
    assert_eq!(second.sessions_migrated, 0);
    assert_eq!(second.plans_migrated, 0);
    assert_eq!(second.learned_migrated, 0);
    assert_eq!(second.skipped, second.total_files);
    assert_eq!(second.total_files, 3);
    assert!(second.errors.is_empty());

    let stats = store.stats(None).unwrap();
    assert_eq!(stats.projects, 1);
    assert_eq!(stats.sessions + stats.plans + stats.patterns, 3);
    assert_eq!(stats.tracked_files, 3);
}

#[test]
fn rerun_from_a_fresh_process_is_idempotent() {
    let fx = Fixture::new();
    fx.write("sessions/a.md", SESSION);
    fx.write("learned/x.md", "x");

    {
        let mut store = fx.store();
        migrate(&store, fx.root());
        store.close().unwrap();
    }

    let store = fx.store();
    let again = migrate(&store, fx.root());
    assert_eq!(again.skipped, 2);
    assert_eq!(again.migrated(), 0);
}

#[test]
fn bodies_are_preserved_byte_for_byte() {
    let fx = Fixture::new();
    let body = "\n# Heading\n\n  indented `code`\r\n\ttab ünïcödé\n\n\n";
    fx.write("sessions/s.md", &format!("---\ndate: 2026-01-01\n---{body}"));
    fx.write("PLAN_p.md", &format!("---\ntitle: P\n---\n{body}"));
    fx.write("learned/l.md", body);
    let store = fx.store();
    migrate(&store, fx.root());

    let project = store.list_projects().unwrap().remove(0);
    assert_eq!(
        store.get_plan(&project.id, "p").unwrap().content,
        body
    );
    assert_eq!(store.get_pattern(&project.id, "l").unwrap().content, body);
    // The session marker line ends right before the body's own newline
    assert_eq!(store.get_session(&project.id, "s").unwrap().content, &body[1..]);
}

#[test]
fn one_bad_file_does_not_sink_the_rest() {
    let fx = Fixture::new();
    fx.write("sessions/one.md", SESSION);
    fx.write("sessions/two.md", "plain session\n");
    let bad = fx.write("learned/broken.md", "---\ntopics: [a, b\nstatus: ok\n---\nbody\n");
    fx.write("learned/fine.md", "fine\n");
    let store = fx.store();

    let result = migrate(&store, fx.root());
    assert_eq!(result.sessions_migrated, 2);
    assert_eq!(result.learned_migrated, 1);
    assert_eq!(result.total_files, 4);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains(&bad.display().to_string()));

    // Fixing the file picks it up on the next run
    fs::write(&bad, "---\ntopics: [a, b]\n---\nbody\n").unwrap();
    let rerun = migrate(&store, fx.root());
    assert_eq!(rerun.learned_migrated, 1);
    assert!(rerun.errors.is_empty());
}

#[test]
fn plan_id_comes_from_file_name() {
    let fx = Fixture::new();
    fx.write(
        "PLAN_mcp_migration.md",
        "---\ntitle: Totally Different Title\n---\nMove the tools.\n",
    );
    let store = fx.store();
    migrate(&store, fx.root());

    let plans = store.query_plans(&PlanFilter::default()).unwrap();
    assert_eq!(plans.count, 1);
    assert_eq!(plans.items[0].id, "mcp_migration");
    assert_eq!(plans.items[0].title, "Totally Different Title");
}

#[test]
fn deeply_nested_patterns_are_found() {
    let fx = Fixture::new();
    fx.write("learned/rust/errors/propagation.md", "Use ? everywhere.\n");
    fx.write("learned/a/b/c/d.md", "deep\n");
    let store = fx.store();

    let result = migrate(&store, fx.root());
    assert_eq!(result.learned_migrated, 2);

    let patterns = store.query_patterns(&PatternFilter::default()).unwrap();
    let mut ids: Vec<String> = patterns.items.into_iter().map(|p| p.id).collect();
    ids.sort();
    assert_eq!(ids, vec!["a/b/c/d", "rust/errors/propagation"]);
}

#[test]
fn root_without_knowledge_dir_is_empty() {
    let fx = Fixture::new();
    let store = fx.store();

    let result = migrate(&store, fx.root());
    assert_eq!(result.migrated(), 0);
    assert_eq!(result.skipped, 0);
    assert_eq!(result.total_files, 0);
    assert!(result.errors.is_empty());
}

#[test]
fn search_finds_exact_phrase() {
    let fx = Fixture::new();
    fx.write(
        "learned/db/migration-errors.md",
        "# Handling failures\nWhen migration errors show up, roll back the transaction.\n",
    );
    fx.write("learned/style/naming.md", "# Naming\nPrefer descriptive names.\n");
    let store = fx.store();
    migrate(&store, fx.root());

    let engine = QueryEngine::new(&store);
    let results = engine.search("migration errors", "all", None).unwrap();
    assert!(results.count >= 1);
    assert_eq!(results.results[0].kind, ArtifactKind::Pattern);
    assert_eq!(results.results[0].id, "db/migration-errors");
    assert!(results.results.iter().all(|hit| hit.id != "style/naming"));
}

#[test]
fn search_order_is_stable_across_reindex() {
    let fx = Fixture::new();
    fx.write("sessions/2026-01-01-a.md", "migration planning\n");
    fx.write("sessions/2026-01-02-b.md", "migration rollout and migration review\n");
    fx.write("PLAN_migration.md", "# Migration\nSteps for the migration.\n");
    let store = fx.store();
    migrate(&store, fx.root());

    let engine = QueryEngine::new(&store);
    let before = engine.search("migration", "all", None).unwrap();
    let stats = store.rebuild_index().unwrap();
    assert_eq!(stats.sessions_indexed, 2);
    assert_eq!(stats.plans_indexed, 1);
    let after = engine.search("migration", "all", None).unwrap();
    assert_eq!(before, after);
}

#[test]
fn queries_are_scoped_to_one_project() {
    let fx_a = Fixture::new();
    let fx_b = Fixture::new();
    fx_a.write("sessions/a.md", SESSION);
    fx_b.write("sessions/b.md", SESSION);

    let store = fx_a.store();
    let a = migrate(&store, fx_a.root());
    migrate(&store, fx_b.root());

    let engine = QueryEngine::new(&store).for_project(a.project_id.unwrap());
    let sessions = engine.sessions(&SessionQuery::default()).unwrap();
    assert_eq!(sessions.total, 1);
    assert_eq!(sessions.items[0].id, "a");

    assert_eq!(
        QueryEngine::new(&store)
            .sessions(&SessionQuery::default())
            .unwrap()
            .total,
        2
    );
}

#[test]
fn moved_project_keeps_its_knowledge() {
    let fx = Fixture::new();
    fx.write("sessions/a.md", SESSION);
    let store = fx.store();
    let first = migrate(&store, fx.root());
    let project_id = first.project_id.unwrap();

    let new_home = TempDir::new().unwrap();
    let moved = store.move_project(&project_id, new_home.path()).unwrap();
    assert_eq!(moved.id, project_id);

    let found = store.find_project_by_path(new_home.path()).unwrap();
    assert_eq!(found.map(|p| p.id), Some(project_id));
}

#[test]
fn unwritable_store_location_fails_init() {
    let fx = Fixture::new();
    let blocker = fx.root().join("not-a-dir");
    fs::write(&blocker, "file").unwrap();

    let err = SqliteStore::init(&StoreLocator::file(blocker.join("lore.db"))).unwrap_err();
    assert!(matches!(err, LoreError::StorageInit(_)));
}
