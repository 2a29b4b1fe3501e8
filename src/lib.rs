pub mod artifact;
pub mod cli;
pub mod config;
pub mod error;
pub mod migrate;
pub mod model;
pub mod query;
pub mod source;
pub mod store;

pub use config::Config;
pub use error::{LoreError, ParseError, Result};
pub use migrate::{migrate_from_directory, MigrationResult, Migrator};
pub use query::QueryEngine;
pub use source::{ArtifactSource, SourceRegistry};
pub use store::{SqliteStore, StorageAdapter, StoreLocator};
