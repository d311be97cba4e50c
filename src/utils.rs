//! Utility functions for file naming, date partitions, logging and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Title sanitization into stable, length-bounded file names
//! - The processing-date directory partition
//! - String truncation for log previews
//! - File system validation for the output directory

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Longest file name stem, in characters, that [`sanitize_filename`] returns.
pub const MAX_FILENAME_CHARS: usize = 250;

static ILLEGAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/*?:"<>|\x00-\x08\x0e-\x1f\x7f]"#).expect("static regex"));
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Turn a raw title into a safe file name.
///
/// Characters illegal in file names (`\ / * ? : " < > |` and control
/// characters) are removed, whitespace runs collapse to a single `_`, and the
/// result is cut to [`MAX_FILENAME_CHARS`] characters.
///
/// The function is pure and idempotent, so the same title always lands on the
/// same file name across runs. The result is empty when the title held
/// nothing but illegal characters or whitespace.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(sanitize_filename("Kant's  Ethics"), "Kant's_Ethics");
/// assert_eq!(sanitize_filename("What is <Truth>?"), "What_is_Truth");
/// ```
pub fn sanitize_filename(title: &str) -> String {
    let stripped = ILLEGAL_CHARS.replace_all(title, "");
    let joined = WHITESPACE_RUNS.replace_all(stripped.trim(), "_");
    joined.chars().take(MAX_FILENAME_CHARS).collect()
}

/// File name an article with this title is stored under.
///
/// The title is lowercased before sanitizing and the extension is appended
/// after truncation, so it survives long titles. Returns `None` when the
/// sanitized stem is empty.
pub fn article_file_name(title: &str, extension: &str) -> Option<String> {
    let stem = sanitize_filename(&title.to_lowercase());
    if stem.is_empty() {
        None
    } else {
        Some(format!("{stem}{extension}"))
    }
}

/// `YYYY/MM/DD` directory partition for a run date.
pub fn date_partition(date: NaiveDate) -> PathBuf {
    PathBuf::from(format!("{:04}", date.year()))
        .join(format!("{:02}", date.month()))
        .join(format!("{:02}", date.day()))
}

/// Full storage path: `source_path/YYYY/MM/DD/file_name`.
pub fn article_path(source_path: &Path, run_date: NaiveDate, file_name: &str) -> PathBuf {
    source_path.join(date_partition(run_date)).join(file_name)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number of
/// dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then writes and removes a probe
/// file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
