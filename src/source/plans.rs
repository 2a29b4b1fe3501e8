//! `PLAN_<id>.md` files directly under the knowledge root
//!
//! The plan id always comes from the file name; a front-matter `title` only
//! feeds the display title.

use std::path::Path;

use super::{modified_date, ArtifactRef, ArtifactSource, Discovery, DiscoveryFailure, KnowledgeRecord};
use crate::artifact::{first_heading, ParsedArtifact};
use crate::model::{ArtifactKind, PlanRecord, PlanStatus};

pub struct PlanSource {
    prefix: String,
}

impl PlanSource {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    /// `PLAN_mcp_migration.md` -> `mcp_migration`
    pub fn plan_id(&self, file_name: &str) -> Option<String> {
        let stem = file_name.strip_prefix(&self.prefix)?;
        let cut = stem.len().checked_sub(3)?;
        if !stem.get(cut..)?.eq_ignore_ascii_case(".md") {
            return None;
        }
        let id = &stem[..cut];
        (!id.is_empty()).then(|| id.to_string())
    }
}

impl ArtifactSource for PlanSource {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Plan
    }

    fn description(&self) -> &str {
        "Work plans"
    }

    fn discover(&self, knowledge_root: &Path) -> Discovery {
        let mut discovery = Discovery::default();

        let entries = match std::fs::read_dir(knowledge_root) {
            Ok(entries) => entries,
            Err(e) => {
                discovery.failures.push(DiscoveryFailure {
                    path: knowledge_root.to_path_buf(),
                    message: e.to_string(),
                });
                return discovery;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    discovery.failures.push(DiscoveryFailure {
                        path: knowledge_root.to_path_buf(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let file_name = entry.file_name().to_string_lossy().to_string();
            let Some(id) = self.plan_id(&file_name) else {
                continue;
            };

            // Follows symlinks, so a dangling link surfaces here
            let path = entry.path();
            let metadata = match std::fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!("Cannot read {}: {}", path.display(), e);
                    discovery.failures.push(DiscoveryFailure {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            discovery.artifacts.push(ArtifactRef {
                kind: ArtifactKind::Plan,
                path,
                relative_path: file_name,
                id,
                modified: modified_date(&metadata),
            });
        }

        discovery
            .artifacts
            .sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        discovery
    }

    fn build_record(
        &self,
        artifact: &ArtifactRef,
        parsed: ParsedArtifact,
        project_id: &str,
    ) -> KnowledgeRecord {
        let fm = &parsed.frontmatter;

        let status = match fm.get_str("status") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "{}: unknown plan status '{}', using {}",
                    artifact.relative_path,
                    raw,
                    PlanStatus::default()
                );
                PlanStatus::default()
            }),
            None => PlanStatus::default(),
        };

        let title = fm
            .get_str("title")
            .or_else(|| first_heading(&parsed.body))
            .unwrap_or_else(|| artifact.id.clone());

        let mut topics = fm.get_list("topics");
        if topics.is_empty() {
            topics = fm.get_list("tags");
        }

        KnowledgeRecord::Plan(PlanRecord {
            id: artifact.id.clone(),
            project_id: project_id.to_string(),
            title,
            status,
            author: fm.get_str("author"),
            created: fm.get_date("created").or_else(|| fm.get_date("date")),
            topics,
            source_path: artifact.relative_path.clone(),
            content: parsed.body,
        })
    }
}
