//! Command-line interface definitions for sep_harvest.
//!
//! Everything about a run lives in the YAML configuration document; the flags
//! here only locate that document and override a few of its values.

use crate::config::{CrawlerConfig, DEFAULT_CONFIG_PATH};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for sep_harvest.
///
/// # Examples
///
/// ```sh
/// # Use ./spider_config.yaml, or the built-in defaults if it is absent
/// sep_harvest
///
/// # Different config file, different storage root
/// sep_harvest --config ./configs/sep.yaml --base-path /data/corpus
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML configuration document
    #[arg(short, long, env = "SEP_HARVEST_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override the root storage directory
    #[arg(short, long)]
    pub base_path: Option<PathBuf>,

    /// Override the logical source name
    #[arg(short, long)]
    pub source: Option<String>,

    /// Override the index page URL
    #[arg(long)]
    pub index_url: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply(&self, mut config: CrawlerConfig) -> CrawlerConfig {
        if let Some(base_path) = &self.base_path {
            config.base_path = base_path.clone();
        }
        if let Some(source) = &self.source {
            config.source = source.clone();
        }
        if let Some(index_url) = &self.index_url {
            config.index_url = index_url.clone();
        }
        config
    }
}
