//! Run configuration.
//!
//! The configuration is an optional YAML document. Every key has a built-in
//! default, so a partial document is fine. A document that cannot be read,
//! parsed, or validated is replaced wholesale by [`CrawlerConfig::default`]
//! with a warning; configuration problems never stop a run.
//!
//! ```yaml
//! base_path: downloaded_content
//! source: stanford_encyclopedia_philosophy
//! file_extension: .txt
//! user_agent: "SEPSpider (+https://example.com)"
//! download_delay: 2
//! concurrent_requests: 1
//! ```

use crate::error::ConfigError;
use crate::scrapers::Selectors;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument, warn};
use url::Url;

/// Default location of the configuration document.
pub const DEFAULT_CONFIG_PATH: &str = "spider_config.yaml";

const DEFAULT_DOWNLOAD_DELAY: f64 = 2.0;

/// Immutable settings for a single harvest run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Root storage directory.
    pub base_path: PathBuf,
    /// Logical dataset name; becomes a directory under `base_path`.
    pub source: String,
    /// Extension appended to every article file, including the dot.
    pub file_extension: String,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Minimum seconds between two request dispatches.
    pub download_delay: f64,
    /// Upper bound on in-flight article requests.
    pub concurrent_requests: usize,
    /// Page whose anchors enumerate the articles.
    pub index_url: String,
    /// Hosts that discovered links may point at. Empty allows any host.
    pub allowed_domains: Vec<String>,
    /// CSS selector for candidate article links on the index page.
    pub link_selector: String,
    /// CSS selector for the article heading.
    pub title_selector: String,
    /// CSS selector for the article body container.
    pub content_selector: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("downloaded_content"),
            source: "stanford_encyclopedia_philosophy".to_string(),
            file_extension: ".txt".to_string(),
            user_agent: "SEPSpider (+https://example.com)".to_string(),
            download_delay: DEFAULT_DOWNLOAD_DELAY,
            concurrent_requests: 1,
            index_url: "https://plato.stanford.edu/contents.html".to_string(),
            allowed_domains: vec!["plato.stanford.edu".to_string()],
            link_selector: "a[href]".to_string(),
            title_selector: "h1".to_string(),
            content_selector: "div#main-text".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl CrawlerConfig {
    /// Read, parse and validate a configuration document.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CrawlerConfig =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the document at `path`, or fall back to the built-in defaults.
    #[instrument(level = "info", fields(path = %path.display()))]
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                info!(source = %config.source, "Loaded configuration");
                config
            }
            Err(e) => {
                warn!(error = %e, "Error loading configuration; using default configuration");
                Self::default()
            }
        }
    }

    /// Check the values that would otherwise fail later in the run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrent_requests == 0 {
            return Err(invalid("concurrent_requests", "must be at least 1"));
        }
        if Duration::try_from_secs_f64(self.download_delay).is_err() {
            return Err(invalid(
                "download_delay",
                format!("must be a representable non-negative number of seconds, got {}", self.download_delay),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be at least 1"));
        }
        if self.source.trim().is_empty() {
            return Err(invalid("source", "must not be empty"));
        }
        if self.file_extension.is_empty() {
            return Err(invalid("file_extension", "must not be empty"));
        }
        Url::parse(&self.index_url).map_err(|e| invalid("index_url", e.to_string()))?;
        Selectors::compile(self)?;
        Ok(())
    }

    /// Minimum spacing between request dispatches.
    ///
    /// An unrepresentable delay (never present after [`validate`](Self::validate))
    /// maps to the default.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.download_delay)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_DOWNLOAD_DELAY))
    }

    /// Directory holding every article of this source.
    pub fn source_path(&self) -> PathBuf {
        self.base_path.join(&self.source)
    }

    /// Location of the run summary.
    pub fn stats_path(&self) -> PathBuf {
        self.base_path.join(format!("{}_stats.json", self.source))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
