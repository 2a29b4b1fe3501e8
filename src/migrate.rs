//! Migration coordinator: knowledge directory -> store
//!
//! Files whose bytes match the fingerprint recorded by a previous run are
//! skipped without parsing. A bad file is reported in
//! [`MigrationResult::errors`] and never aborts the run; only a store that
//! cannot be used at all stops it.

use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::artifact;
use crate::config::KnowledgeConfig;
use crate::error::{LoreError, Result};
use crate::model::{ArtifactKind, MigrationEntry, UpsertOutcome};
use crate::source::{ArtifactRef, ArtifactSource, KnowledgeRecord, SourceRegistry};
use crate::store::StorageAdapter;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationResult {
    pub project_id: Option<String>,
    pub sessions_migrated: usize,
    pub plans_migrated: usize,
    pub learned_migrated: usize,
    /// Files whose fingerprint matched the previous run
    pub skipped: usize,
    /// Changed files whose typed content turned out identical
    pub unchanged: usize,
    /// Every file discovered: migrated + skipped + unchanged + errored
    pub total_files: usize,
    pub errors: Vec<String>,
}

impl MigrationResult {
    pub fn migrated(&self) -> usize {
        self.sessions_migrated + self.plans_migrated + self.learned_migrated
    }
}

enum FileOutcome {
    Skipped,
    Stored(ArtifactKind, UpsertOutcome),
}

pub struct Migrator<'a, S: StorageAdapter> {
    store: &'a S,
    knowledge: KnowledgeConfig,
    registry: SourceRegistry,
}

impl<'a, S: StorageAdapter> Migrator<'a, S> {
    pub fn new(store: &'a S, knowledge: &KnowledgeConfig) -> Self {
        Self {
            store,
            knowledge: knowledge.clone(),
            registry: SourceRegistry::new(knowledge),
        }
    }

    /// Migrate `<root>/<knowledge dir>` into the store.
    ///
    /// A missing knowledge directory is not an error: the result is all
    /// zeros and no project is registered.
    pub fn migrate_from_directory(&self, root: &Path) -> Result<MigrationResult> {
        let knowledge_root = self.knowledge.root_for(root);
        if !knowledge_root.is_dir() {
            tracing::info!(
                "No knowledge directory at {}, nothing to migrate",
                knowledge_root.display()
            );
            return Ok(MigrationResult::default());
        }

        let project_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let project = self.store.ensure_project(&project_root)?;

        let mut result = MigrationResult {
            project_id: Some(project.id.clone()),
            ..Default::default()
        };

        for source in self.registry.all_sources() {
            let discovery = source.discover(&knowledge_root);
            tracing::debug!(
                "{}: {} candidate files",
                source.description(),
                discovery.artifacts.len()
            );

            for failure in discovery.failures {
                result
                    .errors
                    .push(format!("{}: {}", failure.path.display(), failure.message));
            }

            for artifact in &discovery.artifacts {
                result.total_files += 1;

                match self.migrate_file(source, artifact, &project.id) {
                    Ok(FileOutcome::Skipped) => {
                        tracing::debug!("Skipping unchanged {}", artifact.relative_path);
                        result.skipped += 1;
                    }
                    Ok(FileOutcome::Stored(_, UpsertOutcome::Unchanged)) => {
                        result.unchanged += 1;
                    }
                    Ok(FileOutcome::Stored(kind, _)) => match kind {
                        ArtifactKind::Session => result.sessions_migrated += 1,
                        ArtifactKind::Plan => result.plans_migrated += 1,
                        ArtifactKind::Pattern => result.learned_migrated += 1,
                    },
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        tracing::warn!("Failed to migrate {}: {}", artifact.path.display(), e);
                        result
                            .errors
                            .push(format!("{}: {}", artifact.path.display(), e));
                    }
                }
            }
        }

        tracing::info!(
            "Migrated {} sessions, {} plans, {} patterns from {} ({} skipped, {} errors)",
            result.sessions_migrated,
            result.plans_migrated,
            result.learned_migrated,
            knowledge_root.display(),
            result.skipped,
            result.errors.len()
        );

        Ok(result)
    }

    fn migrate_file(
        &self,
        source: &dyn ArtifactSource,
        artifact: &ArtifactRef,
        project_id: &str,
    ) -> Result<FileOutcome> {
        let bytes = std::fs::read(&artifact.path)?;
        let fingerprint = fingerprint(&bytes);

        let previous = self
            .store
            .migration_fingerprint(project_id, &artifact.relative_path)?;
        if previous.as_deref() == Some(fingerprint.as_str()) {
            return Ok(FileOutcome::Skipped);
        }

        let contents = String::from_utf8(bytes).map_err(|e| {
            LoreError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        let parsed = artifact::parse(&contents);
        if let Some(err) = parsed.error {
            return Err(err.into());
        }

        let record = source.build_record(artifact, parsed, project_id);
        let kind = record.kind();
        let entity_id = record.id().to_string();

        let outcome = match &record {
            KnowledgeRecord::Session(r) => self.store.upsert_session(r)?,
            KnowledgeRecord::Plan(r) => self.store.upsert_plan(r)?,
            KnowledgeRecord::Pattern(r) => self.store.upsert_pattern(r)?,
        };

        self.store.record_migration(&MigrationEntry {
            project_id: project_id.to_string(),
            source_path: artifact.relative_path.clone(),
            kind,
            entity_id,
            fingerprint,
        })?;

        tracing::debug!("{} {} ({})", outcome.as_str(), artifact.relative_path, kind);
        Ok(FileOutcome::Stored(kind, outcome))
    }
}

/// Convenience wrapper around [`Migrator`].
pub fn migrate_from_directory<S: StorageAdapter>(
    store: &S,
    knowledge: &KnowledgeConfig,
    root: &Path,
) -> Result<MigrationResult> {
    Migrator::new(store, knowledge).migrate_from_directory(root)
}

/// SHA-256 of the raw file bytes, hex encoded
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
