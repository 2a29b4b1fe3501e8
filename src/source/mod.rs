//! Artifact sources: discovery and record building per knowledge kind
//!
//! Layout of a knowledge directory:
//! - `sessions/**/*.md`: dated session logs
//! - `PLAN_<id>.md` directly under the root: work plans
//! - `learned/**/*.md`: learned patterns, nested at any depth

mod learned;
mod plans;
mod sessions;

pub use learned::PatternSource;
pub use plans::PlanSource;
pub use sessions::SessionSource;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use walkdir::WalkDir;

use crate::artifact::ParsedArtifact;
use crate::config::KnowledgeConfig;
use crate::model::{ArtifactKind, PatternRecord, PlanRecord, SessionRecord};

/// A candidate file found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    /// Relative to the knowledge root, `/`-separated. Key of the
    /// migration-tracking table.
    pub relative_path: String,
    /// Identity derived from the path.
    pub id: String,
    pub modified: Option<NaiveDate>,
}

/// Something discovery could not look at (unreadable directory, broken
/// entry). Reported but not counted as a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryFailure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub artifacts: Vec<ArtifactRef>,
    pub failures: Vec<DiscoveryFailure>,
}

/// Typed record ready for the matching upsert.
#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeRecord {
    Session(SessionRecord),
    Plan(PlanRecord),
    Pattern(PatternRecord),
}

impl KnowledgeRecord {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            KnowledgeRecord::Session(_) => ArtifactKind::Session,
            KnowledgeRecord::Plan(_) => ArtifactKind::Plan,
            KnowledgeRecord::Pattern(_) => ArtifactKind::Pattern,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            KnowledgeRecord::Session(r) => &r.id,
            KnowledgeRecord::Plan(r) => &r.id,
            KnowledgeRecord::Pattern(r) => &r.id,
        }
    }
}

/// One category of knowledge artifact.
pub trait ArtifactSource: Send + Sync {
    fn kind(&self) -> ArtifactKind;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Find candidate files under the knowledge root. A missing
    /// subdirectory yields nothing.
    fn discover(&self, knowledge_root: &Path) -> Discovery;

    /// Map front matter onto typed columns, defaulting missing fields.
    /// The body is carried over untouched.
    fn build_record(
        &self,
        artifact: &ArtifactRef,
        parsed: ParsedArtifact,
        project_id: &str,
    ) -> KnowledgeRecord;
}

/// Registry of the sources a migration walks, in order.
pub struct SourceRegistry {
    sources: Vec<Box<dyn ArtifactSource>>,
}

impl SourceRegistry {
    pub fn new(config: &KnowledgeConfig) -> Self {
        let mut registry = Self { sources: vec![] };
        registry.register(Box::new(SessionSource::new(&config.sessions_dir)));
        registry.register(Box::new(PlanSource::new(&config.plan_prefix)));
        registry.register(Box::new(PatternSource::new(&config.learned_dir)));
        registry
    }

    pub fn register(&mut self, source: Box<dyn ArtifactSource>) {
        self.sources.push(source);
    }

    pub fn all_sources(&self) -> Vec<&dyn ArtifactSource> {
        self.sources.iter().map(|s| s.as_ref()).collect()
    }
}

// ============================================
// SHARED DISCOVERY HELPERS
// ============================================

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

/// `/`-joined path of `path` relative to `base`.
fn relative_key(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn strip_md(key: &str) -> &str {
    let cut = key.len().saturating_sub(3);
    match key.get(cut..) {
        Some(ext) if ext.eq_ignore_ascii_case(".md") => &key[..cut],
        _ => key,
    }
}

fn modified_date(metadata: &std::fs::Metadata) -> Option<NaiveDate> {
    metadata
        .modified()
        .ok()
        .map(|t| DateTime::<Utc>::from(t).date_naive())
}

/// Walk `dir` for markdown files; ids are paths relative to `dir` without
/// the extension. Results are sorted by relative path.
fn walk_markdown(
    kind: ArtifactKind,
    knowledge_root: &Path,
    dir: &Path,
) -> Discovery {
    let mut discovery = Discovery::default();
    if !dir.is_dir() {
        return discovery;
    }

    for entry in WalkDir::new(dir).min_depth(1).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| dir.to_path_buf());
                tracing::warn!("Cannot read {}: {}", path.display(), e);
                discovery.failures.push(DiscoveryFailure {
                    path,
                    message: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }

        let (Some(relative_path), Some(within_dir)) = (
            relative_key(knowledge_root, entry.path()),
            relative_key(dir, entry.path()),
        ) else {
            continue;
        };

        discovery.artifacts.push(ArtifactRef {
            kind,
            path: entry.path().to_path_buf(),
            relative_path,
            id: strip_md(&within_dir).to_string(),
            modified: entry.metadata().ok().as_ref().and_then(modified_date),
        });
    }

    discovery
        .artifacts
        .sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    discovery
}
