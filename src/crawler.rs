//! Run orchestration.
//!
//! A [`RunContext`] carries everything one run shares between articles: the
//! configuration, compiled selectors, the run date used for the directory
//! partition, the dedup ledger and the counters. Nothing lives in globals, so
//! two runs against different sources cannot see each other's state.
//!
//! [`Crawler::run`] fetches the index, then feeds the discovered URLs through
//! [`process_article`] with at most `concurrent_requests` in flight. Setting
//! the stop flag stops new articles from being dispatched; those already in
//! flight still reach a terminal state.

use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use crate::fetch::{HttpFetcher, PageFetcher, Polite};
use crate::integrity::{ArticleStore, VerifiedStore};
use crate::ledger::DedupLedger;
use crate::models::{Outcome, RunSummary};
use crate::processor::process_article;
use crate::scrapers::index::index_articles;
use crate::scrapers::Selectors;
use crate::stats::{flush_summary, RunStats};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::fs;
use tracing::{info, instrument, warn};

/// Run-scoped state shared by every article attempt.
#[derive(Debug)]
pub struct RunContext {
    pub config: CrawlerConfig,
    pub selectors: Selectors,
    /// Date partition for every file written in this run.
    pub run_date: NaiveDate,
    pub stats: RunStats,
    ledger: Mutex<DedupLedger>,
}

impl RunContext {
    /// Validate the configuration, create the base directory and seed the
    /// ledger from disk.
    #[instrument(level = "info", skip(config), fields(source = %config.source))]
    pub async fn prepare(config: CrawlerConfig, run_date: NaiveDate) -> Result<Self, CrawlError> {
        config.validate()?;
        let selectors = Selectors::compile(&config)?;

        fs::create_dir_all(&config.base_path)
            .await
            .map_err(|source| CrawlError::Storage {
                path: config.base_path.clone(),
                source,
            })?;

        let source_path = config.source_path();
        let ledger = DedupLedger::load(&source_path, &config.file_extension)
            .await
            .map_err(|source| CrawlError::Storage {
                path: source_path.clone(),
                source,
            })?;

        Ok(Self {
            config,
            selectors,
            run_date,
            stats: RunStats::new(),
            ledger: Mutex::new(ledger),
        })
    }

    /// Lock the ledger. Never hold the guard across an `.await`.
    pub fn ledger(&self) -> MutexGuard<'_, DedupLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The crawler: a run context plus the fetcher and store it drives.
pub struct Crawler<F, S = VerifiedStore> {
    ctx: RunContext,
    fetcher: F,
    store: S,
    stop: Arc<AtomicBool>,
}

impl Crawler<Polite<HttpFetcher>> {
    /// Production crawler: polite HTTP fetching into verified local files.
    pub async fn from_config(config: CrawlerConfig, run_date: NaiveDate) -> Result<Self, CrawlError> {
        let ctx = RunContext::prepare(config, run_date).await?;
        let fetcher = HttpFetcher::new(&ctx.config).map_err(CrawlError::Client)?;
        let fetcher = Polite::new(fetcher, ctx.config.delay());
        Ok(Self::new(ctx, fetcher, VerifiedStore))
    }
}

impl<F, S> Crawler<F, S>
where
    F: PageFetcher,
    S: ArticleStore,
{
    pub fn new(ctx: RunContext, fetcher: F, store: S) -> Self {
        Self {
            ctx,
            fetcher,
            store,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Flag that stops dispatching new articles once set.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Crawl the index and every article it links to.
    ///
    /// Only a failed index fetch is an error; per-article failures are counted.
    #[instrument(level = "info", skip_all, fields(source = %self.ctx.config.source))]
    pub async fn run(&self) -> Result<RunSummary, CrawlError> {
        let ctx = &self.ctx;
        let fetcher = &self.fetcher;
        let store = &self.store;
        let stop = Arc::clone(&self.stop);

        let urls = index_articles(
            fetcher,
            &ctx.config.index_url,
            &ctx.selectors.link,
            &ctx.config.allowed_domains,
        )
        .await?;
        let discovered = urls.len();

        let outcomes: Vec<Outcome> = stream::iter(urls)
            .take_while(move |_| {
                let stopped = stop.load(Ordering::SeqCst);
                if stopped {
                    warn!("Stop requested; no further articles will be dispatched");
                }
                std::future::ready(!stopped)
            })
            .map(|url| async move { process_article(ctx, fetcher, store, &url).await })
            .buffer_unordered(ctx.config.concurrent_requests)
            .collect()
            .await;

        let summary = ctx.stats.snapshot();
        info!(
            discovered,
            dispatched = outcomes.len(),
            attempted = summary.total(),
            scraped = summary.articles_scraped,
            skipped = summary.articles_skipped,
            errors = summary.errors,
            "Crawl finished"
        );
        Ok(summary)
    }

    /// Log the counters and write the run summary. Never fails.
    pub async fn finish(&self) -> RunSummary {
        info!("Spider closing");
        let summary = self.ctx.stats.snapshot();
        flush_summary(&summary, &self.ctx.config.stats_path()).await;
        summary
    }
}
