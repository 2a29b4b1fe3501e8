//! Configuration management with YAML support

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::{DEFAULT_LIMIT, MAX_LIMIT};

/// Environment variable that replaces `database.path`
pub const DB_ENV_VAR: &str = "LOREKEEP_DB";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Where knowledge files live inside a project root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default = "default_knowledge_dir")]
    pub dir: String,

    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: String,

    #[serde(default = "default_learned_dir")]
    pub learned_dir: String,

    #[serde(default = "default_plan_prefix")]
    pub plan_prefix: String,
}

/// Listing limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_query_limit")]
    pub default_limit: usize,

    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
}

// Default value functions
fn default_database_path() -> String {
    "~/.local/share/lorekeep/lorekeep.db".to_string()
}

fn default_knowledge_dir() -> String {
    ".lore".to_string()
}

fn default_sessions_dir() -> String {
    "sessions".to_string()
}

fn default_learned_dir() -> String {
    "learned".to_string()
}

fn default_plan_prefix() -> String {
    "PLAN_".to_string()
}

fn default_query_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_max_limit() -> usize {
    MAX_LIMIT
}

fn default_search_limit() -> usize {
    20
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            dir: default_knowledge_dir(),
            sessions_dir: default_sessions_dir(),
            learned_dir: default_learned_dir(),
            plan_prefix: default_plan_prefix(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_query_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
        }
    }
}

impl KnowledgeConfig {
    /// Knowledge directory for a project root
    pub fn root_for(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.dir)
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./lorekeep.yaml (current directory)
    /// 3. ~/.config/lorekeep/lorekeep.yaml
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            let expanded = shellexpand::tilde(path).to_string();
            if !Path::new(&expanded).exists() {
                anyhow::bail!("config file not found: {}", path);
            }
            return Self::from_file(Path::new(&expanded));
        }

        let mut search_paths = vec!["lorekeep.yaml".to_string()];
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(
                config_dir
                    .join("lorekeep")
                    .join("lorekeep.yaml")
                    .to_string_lossy()
                    .to_string(),
            );
        }

        for search_path in &search_paths {
            if Path::new(search_path).exists() {
                tracing::debug!("Loading config from {}", search_path);
                return Self::from_file(Path::new(search_path));
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        if config.query.max_limit == 0 || config.query.default_limit == 0 {
            anyhow::bail!("query limits must be positive");
        }
        Ok(config)
    }

    /// Get the database path: `LOREKEEP_DB` if set, otherwise
    /// `database.path` with `~` expanded
    pub fn database_path(&self) -> PathBuf {
        let raw = std::env::var(DB_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.database.path.clone());
        PathBuf::from(shellexpand::tilde(&raw).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.knowledge.dir, ".lore");
        assert_eq!(config.knowledge.plan_prefix, "PLAN_");
        assert_eq!(config.query.default_limit, 50);
        assert_eq!(config.query.max_limit, 500);
        assert_eq!(config.search.default_limit, 20);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
database:
  path: ~/.local/share/lorekeep/test.db

knowledge:
  dir: .knowledge
  plan_prefix: PLAN-

query:
  max_limit: 100
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.database.path, "~/.local/share/lorekeep/test.db");
        assert_eq!(config.knowledge.dir, ".knowledge");
        assert_eq!(config.knowledge.sessions_dir, "sessions");
        assert_eq!(config.knowledge.plan_prefix, "PLAN-");
        assert_eq!(config.query.max_limit, 100);
        assert_eq!(config.query.default_limit, 50);
    }

    #[test]
    fn test_zero_limits_rejected() {
        assert!(Config::from_yaml("query:\n  max_limit: 0\n").is_err());
    }

    #[test]
    fn test_database_path_from_config() {
        let mut config = Config::default();
        config.database.path = "/tmp/lorekeep-test.db".to_string();
        if std::env::var(DB_ENV_VAR).is_err() {
            assert_eq!(config.database_path(), PathBuf::from("/tmp/lorekeep-test.db"));
        }
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(Config::load(Some(missing.to_str().unwrap())).is_err());
    }

    #[test]
    fn test_knowledge_root() {
        let knowledge = KnowledgeConfig::default();
        assert_eq!(
            knowledge.root_for(Path::new("/work/app")),
            PathBuf::from("/work/app/.lore")
        );
    }
}
