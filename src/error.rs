//! Error types shared by the parser, store, migration and query layers

use std::fmt;
use std::io;

use thiserror::Error;

/// Malformed front matter in a single artifact.
///
/// Returned in-band by the artifact parser so callers can decide whether to
/// skip the file; never fatal on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }
}

impl From<serde_yaml::Error> for ParseError {
    fn from(err: serde_yaml::Error) -> Self {
        let location = err.location();
        Self {
            message: err.to_string(),
            line: location.as_ref().map(|l| l.line()),
            column: location.as_ref().map(|l| l.column()),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "invalid front matter at {line}:{column}: {}", self.message)
            }
            _ => write!(f, "invalid front matter: {}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Error, Debug)]
pub enum LoreError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Store location unwritable or schema version incompatible.
    #[error("Storage init error: {0}")]
    StorageInit(String),

    #[error("Storage is closed")]
    StorageClosed,

    /// Invalid filter or search arguments.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Errors that must abort a migration run instead of being recorded
    /// against a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StorageInit(_) | Self::StorageClosed)
    }
}

pub type Result<T> = std::result::Result<T, LoreError>;
