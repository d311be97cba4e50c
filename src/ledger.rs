//! The dedup ledger: which article file names already exist on disk.
//!
//! The ledger is seeded once at startup by walking the source directory and is
//! append-only afterwards. Keys are bare file names, not paths, so an article
//! saved under an earlier day's partition still counts as downloaded.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// File names already persisted for a source, plus names claimed by saves that
/// are still in flight.
#[derive(Debug, Default)]
pub struct DedupLedger {
    downloaded: HashSet<String>,
    in_flight: HashSet<String>,
}

impl DedupLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `source_path` and collect every file name ending in `extension`.
    ///
    /// A missing directory yields an empty ledger. Unreadable sub-directories
    /// are logged and skipped.
    #[instrument(level = "info", fields(path = %source_path.display()))]
    pub async fn load(source_path: &Path, extension: &str) -> io::Result<Self> {
        let mut ledger = Self::new();
        if !fs::try_exists(source_path).await? {
            info!("Source directory does not exist yet; starting with an empty ledger");
            return Ok(ledger);
        }

        let mut pending: Vec<PathBuf> = vec![source_path.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if dir == source_path => return Err(e),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                    continue;
                }
            };

            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if file_type.is_file() {
                    let name = entry.file_name();
                    if let Some(name) = name.to_str() {
                        if name.ends_with(extension) {
                            ledger.downloaded.insert(name.to_string());
                        }
                    }
                }
            }
        }

        info!(count = ledger.len(), "Found existing files");
        Ok(ledger)
    }

    /// Whether `file_name` has been persisted, by this run or an earlier one.
    pub fn contains(&self, file_name: &str) -> bool {
        self.downloaded.contains(file_name)
    }

    /// Claim `file_name` for a save that is about to start.
    ///
    /// Returns `false` if the name is already downloaded or claimed by another
    /// in-flight save.
    pub fn reserve(&mut self, file_name: &str) -> bool {
        if self.contains(file_name) {
            return false;
        }
        self.in_flight.insert(file_name.to_string())
    }

    /// Drop a claim made by [`reserve`](Self::reserve) after a failed save.
    pub fn release(&mut self, file_name: &str) {
        self.in_flight.remove(file_name);
    }

    /// Mark `file_name` as persisted. Call only after a verified save.
    pub fn record(&mut self, file_name: &str) {
        self.in_flight.remove(file_name);
        self.downloaded.insert(file_name.to_string());
    }

    /// Number of persisted file names.
    pub fn len(&self) -> usize {
        self.downloaded.len()
    }
}
