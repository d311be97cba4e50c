//! Run statistics: three mutually exclusive outcome counters.
//!
//! Counters are atomics so concurrent article completions never race. The
//! summary is written once, when the run ends; a failed write is logged and
//! otherwise ignored because the articles themselves are already on disk.

use crate::error::StatsPersistError;
use crate::models::{Outcome, RunSummary};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{error, info, instrument};

#[derive(Debug, Default)]
pub struct RunStats {
    scraped: AtomicU64,
    skipped: AtomicU64,
    errors: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one terminal outcome.
    pub fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Scraped => &self.scraped,
            Outcome::Skipped => &self.skipped,
            Outcome::Error => &self.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RunSummary {
        RunSummary {
            articles_scraped: self.scraped.load(Ordering::Relaxed),
            articles_skipped: self.skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Emit one human-readable line per counter.
pub fn log_summary(summary: &RunSummary) {
    info!("Articles scraped: {}", summary.articles_scraped);
    info!("Articles skipped: {}", summary.articles_skipped);
    info!("Errors: {}", summary.errors);
}

/// Serialize `summary` to `path` as compact JSON.
#[instrument(level = "info", skip(summary), fields(path = %path.display()))]
pub async fn write_summary(summary: &RunSummary, path: &Path) -> Result<(), StatsPersistError> {
    let json = serde_json::to_string(summary)?;
    fs::write(path, json)
        .await
        .map_err(|source| StatsPersistError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Stats saved");
    Ok(())
}

/// Log and persist the summary; failures are logged, never returned.
pub async fn flush_summary(summary: &RunSummary, path: &Path) {
    log_summary(summary);
    if let Err(e) = write_summary(summary, path).await {
        error!(error = %e, "Error saving stats file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_each_outcome_increments_one_counter() {
        let stats = RunStats::new();
        stats.record(Outcome::Scraped);
        stats.record(Outcome::Skipped);
        stats.record(Outcome::Skipped);
        stats.record(Outcome::Error);

        let summary = stats.snapshot();
        assert_eq!(summary.articles_scraped, 1);
        assert_eq!(summary.articles_skipped, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        let stats = Arc::new(RunStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.record(Outcome::Scraped);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(stats.snapshot().articles_scraped, 8000);
    }

    #[tokio::test]
    async fn test_write_summary_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sep_stats.json");
        let summary = RunSummary {
            articles_scraped: 3,
            articles_skipped: 0,
            errors: 0,
        };

        write_summary(&summary, &path).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"articles_scraped":3,"articles_skipped":0,"errors":0}"#
        );
    }

    #[tokio::test]
    async fn test_flush_summary_survives_unwritable_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing").join("sep_stats.json");

        flush_summary(&RunSummary::default(), &path).await;
        assert!(!path.exists());
        assert!(matches!(
            write_summary(&RunSummary::default(), &path).await,
            Err(StatsPersistError::Write { .. })
        ));
    }
}
