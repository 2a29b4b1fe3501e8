//! Learned patterns under `learned/`, nested at any depth

use std::path::Path;

use super::{walk_markdown, ArtifactRef, ArtifactSource, Discovery, KnowledgeRecord};
use crate::artifact::{first_heading, ParsedArtifact};
use crate::model::{ArtifactKind, PatternRecord};

const DEFAULT_CATEGORY: &str = "general";

pub struct PatternSource {
    dir_name: String,
}

impl PatternSource {
    pub fn new(dir_name: &str) -> Self {
        Self {
            dir_name: dir_name.to_string(),
        }
    }
}

impl ArtifactSource for PatternSource {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Pattern
    }

    fn description(&self) -> &str {
        "Learned patterns"
    }

    fn discover(&self, knowledge_root: &Path) -> Discovery {
        walk_markdown(
            ArtifactKind::Pattern,
            knowledge_root,
            &knowledge_root.join(&self.dir_name),
        )
    }

    fn build_record(
        &self,
        artifact: &ArtifactRef,
        parsed: ParsedArtifact,
        project_id: &str,
    ) -> KnowledgeRecord {
        let fm = &parsed.frontmatter;

        let category = fm
            .get_str("category")
            .or_else(|| {
                artifact
                    .id
                    .split_once('/')
                    .map(|(dir, _)| dir.to_string())
            })
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let title = fm
            .get_str("title")
            .or_else(|| first_heading(&parsed.body))
            .unwrap_or_else(|| {
                artifact
                    .id
                    .rsplit('/')
                    .next()
                    .unwrap_or(&artifact.id)
                    .to_string()
            });

        let keywords = ["keywords", "triggers", "tags"]
            .iter()
            .map(|key| fm.get_list(key))
            .find(|list| !list.is_empty())
            .unwrap_or_default();

        KnowledgeRecord::Pattern(PatternRecord {
            id: artifact.id.clone(),
            project_id: project_id.to_string(),
            category,
            title,
            keywords,
            source_path: artifact.relative_path.clone(),
            content: parsed.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::parse;
    use std::fs;

    fn build(id: &str, contents: &str) -> PatternRecord {
        let artifact = ArtifactRef {
            kind: ArtifactKind::Pattern,
            path: format!("/k/learned/{id}.md").into(),
            relative_path: format!("learned/{id}.md"),
            id: id.to_string(),
            modified: None,
        };
        match PatternSource::new("learned").build_record(&artifact, parse(contents), "p1") {
            KnowledgeRecord::Pattern(record) => record,
            other => panic!("expected pattern, got {other:?}"),
        }
    }

    #[test]
    fn nested_files_are_discovered_with_path_ids() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("learned/rust/errors")).unwrap();
        fs::write(root.join("learned/rust/errors/propagation.md"), "x").unwrap();
        fs::write(root.join("learned/top.md"), "y").unwrap();

        let found = PatternSource::new("learned").discover(root);
        let ids: Vec<&str> = found.artifacts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["rust/errors/propagation", "top"]);
    }

    #[test]
    fn missing_learned_dir_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let found = PatternSource::new("learned").discover(dir.path());
        assert!(found.artifacts.is_empty());
        assert!(found.failures.is_empty());
    }

    #[test]
    fn category_defaults_from_directory_then_general() {
        let nested = build("rust/errors/propagation", "# Propagate errors\nUse ?\n");
        assert_eq!(nested.category, "rust");
        assert_eq!(nested.title, "Propagate errors");

        let flat = build("naming", "Prefer short names\n");
        assert_eq!(flat.category, "general");
        assert_eq!(flat.title, "naming");
    }

    #[test]
    fn keywords_accept_triggers_alias() {
        let record = build("x", "---\ncategory: testing\ntriggers: [flaky, retry]\n---\nbody\n");
        assert_eq!(record.category, "testing");
        assert_eq!(record.keywords, vec!["flaky", "retry"]);
        assert_eq!(record.content, "body\n");
    }
}
