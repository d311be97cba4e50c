//! Data models shared by the harvest pipeline.
//!
//! - [`ArticleRecord`]: one extracted article, ready to be persisted
//! - [`Outcome`]: the terminal state of a single article attempt
//! - [`RunSummary`]: the counters written to the per-source summary file

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An article extracted from a fetched page.
///
/// Records are only built from pages with a non-empty title and body, and only
/// live for the duration of one processing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    /// The page the article was fetched from.
    pub url: String,
    /// The title as it appeared in the page heading.
    pub title: String,
    /// Visible text under the content container.
    pub body: String,
    /// Sanitized file name, including the extension.
    pub file_name: String,
    /// Where the body is written.
    pub path: PathBuf,
}

/// Terminal state of one article attempt. Exactly one per attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Scraped,
    Skipped,
    Error,
}

/// Counters persisted at the end of a run.
///
/// Serialized as `{"articles_scraped":N,"articles_skipped":N,"errors":N}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub articles_scraped: u64,
    pub articles_skipped: u64,
    pub errors: u64,
}

impl RunSummary {
    /// Number of article attempts that reached a terminal state.
    pub fn total(&self) -> u64 {
        self.articles_scraped + self.articles_skipped + self.errors
    }
}
