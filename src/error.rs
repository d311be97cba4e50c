//! Error taxonomy for a harvest run.
//!
//! Only [`CrawlError`] ever reaches `main`. Everything else is absorbed at a
//! component boundary: configuration problems fall back to defaults, per-article
//! failures become counters, and a failed summary write becomes a log line.

use std::path::PathBuf;
use thiserror::Error;

/// Problems with the optional configuration document. Always recoverable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// A page could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("invalid url `{0}`")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// The fetched page does not have the expected article shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("page has no title")]
    MissingTitle,

    #[error("page has no body text")]
    MissingBody,

    #[error("title `{0}` sanitizes to an empty file name")]
    EmptyFileName(String),
}

/// The file on disk does not match what was written.
#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("digest mismatch for {path}: expected {expected}, found {actual}")]
    DigestMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

/// The run summary could not be written.
#[derive(Debug, Error)]
pub enum StatsPersistError {
    #[error("failed to serialize run summary: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write run summary {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("failed to fetch index page {url}: {source}")]
    Index { url: String, source: FetchError },

    #[error("failed to build http client: {0}")]
    Client(#[source] FetchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        source: std::io::Error,
    },
}
