//! Session logs under `sessions/`

use std::path::Path;

use chrono::Utc;

use super::{walk_markdown, ArtifactRef, ArtifactSource, Discovery, KnowledgeRecord};
use crate::artifact::{first_heading, parse_date_prefix, ParsedArtifact};
use crate::model::{ArtifactKind, SessionRecord, SessionStatus};

pub struct SessionSource {
    dir_name: String,
}

impl SessionSource {
    pub fn new(dir_name: &str) -> Self {
        Self {
            dir_name: dir_name.to_string(),
        }
    }
}

impl ArtifactSource for SessionSource {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Session
    }

    fn description(&self) -> &str {
        "Session logs"
    }

    fn discover(&self, knowledge_root: &Path) -> Discovery {
        walk_markdown(
            ArtifactKind::Session,
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
        let file_name = artifact.id.rsplit('/').next().unwrap_or(&artifact.id);

        if fm.get_str("date").is_some() && fm.get_date("date").is_none() {
            tracing::warn!(
                "{}: unparseable date {:?}, falling back to file name",
                artifact.relative_path,
                fm.get_str("date")
            );
        }
        let date = fm
            .get_date("date")
            .or_else(|| parse_date_prefix(file_name))
            .or(artifact.modified)
            .unwrap_or_else(|| Utc::now().date_naive());

        let status = match fm.get_str("status") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "{}: unknown session status '{}', using {}",
                    artifact.relative_path,
                    raw,
                    SessionStatus::default()
                );
                SessionStatus::default()
            }),
            None => SessionStatus::default(),
        };

        let topic = fm
            .get_str("topic")
            .or_else(|| fm.get_str("title"))
            .or_else(|| first_heading(&parsed.body))
            .unwrap_or_else(|| file_name.to_string());

        let mut topics = fm.get_list("topics");
        if topics.is_empty() {
            topics = fm.get_list("tags");
        }

        KnowledgeRecord::Session(SessionRecord {
            id: artifact.id.clone(),
            project_id: project_id.to_string(),
            date,
            topic,
            topics,
            status,
            author: fm.get_str("author"),
            source_path: artifact.relative_path.clone(),
            content: parsed.body,
        })
    }
}
