//! Error types for duplicate detection and the bundled catalog stores.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of an external catalog capability.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to decode stored value: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("catalog store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by [`crate::detect::DuplicateDetector`].
#[derive(Error, Debug)]
pub enum DetectError {
    /// The queried entry is missing a field the matching stages need.
    #[error("malformed input: entry '{id}' has no {field}")]
    MalformedInput { id: String, field: &'static str },
    /// A store call failed. Never retried here.
    #[error("catalog store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, DetectError>;
