//! # sep_harvest
//!
//! A targeted crawler that harvests long-form articles from a single structured
//! site (by default the Stanford Encyclopedia of Philosophy) into a
//! date-partitioned text archive.
//!
//! ## Features
//!
//! - Crawls one index page and every article it links to, one request at a
//!   time with a fixed politeness delay
//! - Skips articles already present on disk from earlier runs
//! - Verifies every written file against a SHA-256 digest of its content
//! - Writes a per-source JSON summary of scraped, skipped and failed articles
//!
//! ## Usage
//!
//! ```sh
//! sep_harvest --config spider_config.yaml
//! ```
//!
//! ## Architecture
//!
//! 1. **Setup**: load configuration, seed the dedup ledger from disk
//! 2. **Indexing**: fetch the index page and discover article URLs
//! 3. **Processing**: fetch, extract, dedup and store each article
//! 4. **Summary**: log the counters and write `{source}_stats.json`

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::sync::atomic::Ordering;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod crawler;
mod error;
mod fetch;
mod integrity;
mod ledger;
mod models;
mod processor;
mod scrapers;
mod stats;
mod utils;

use cli::Cli;
use config::CrawlerConfig;
use crawler::Crawler;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("sep_harvest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = args.apply(CrawlerConfig::load_or_default(&args.config));

    // Early check: ensure the storage root is writable
    if let Err(e) = ensure_writable_dir(&config.base_path).await {
        error!(
            path = %config.base_path.display(),
            error = %e,
            "Base directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let run_date = Local::now().date_naive();
    let crawler = Crawler::from_config(config, run_date).await?;
    info!(
        %run_date,
        existing = crawler.context().ledger().len(),
        concurrency = crawler.context().config.concurrent_requests,
        "Crawler ready"
    );

    // Ctrl-C stops dispatching; in-flight articles still finish.
    let stop = crawler.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; finishing in-flight articles");
            stop.store(true, Ordering::SeqCst);
        }
    });

    let result = crawler.run().await;
    crawler.finish().await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    if let Err(e) = result {
        error!(error = %e, "Crawl aborted");
        return Err(e.into());
    }
    Ok(())
}
