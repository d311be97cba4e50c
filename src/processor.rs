//! Per-article processing.
//!
//! Every article attempt ends in exactly one [`Outcome`]:
//!
//! ```text
//! fetched ──extract──► named ──ledger──► stored ──verify──► Scraped
//!    │                   │                  │
//!    └─► Error           └─► Skipped        └─► Error
//! ```
//!
//! Errors are absorbed here: they become a log line and a counter increment
//! and never unwind past the article that caused them. The ledger is touched
//! only after a verified save.

use crate::crawler::RunContext;
use crate::error::{ExtractionError, FetchError};
use crate::fetch::PageFetcher;
use crate::integrity::ArticleStore;
use crate::models::{ArticleRecord, Outcome};
use crate::scrapers::article::extract_article;
use crate::utils::{article_file_name, article_path};
use tokio::fs;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Fetch one article and carry it to a terminal state.
#[instrument(level = "info", skip_all, fields(url = %url))]
pub async fn process_article<F, S>(ctx: &RunContext, fetcher: &F, store: &S, url: &Url) -> Outcome
where
    F: PageFetcher,
    S: ArticleStore,
{
    info!("Parsing article");
    let response = fetcher.fetch(url).await;
    process_response(ctx, store, url, response).await
}

/// Drive a fetch result through extraction, dedup and storage, then count it.
pub async fn process_response<S: ArticleStore>(
    ctx: &RunContext,
    store: &S,
    url: &Url,
    response: Result<String, FetchError>,
) -> Outcome {
    let outcome = match response {
        Ok(html) => persist(ctx, store, url, &html).await,
        Err(e) => {
            error!(%url, error = %e, "Article fetch failed");
            Outcome::Error
        }
    };
    ctx.stats.record(outcome);
    outcome
}

/// Build the record for a fetched page: title, body, file name and path.
pub fn build_record(ctx: &RunContext, url: &Url, html: &str) -> Result<ArticleRecord, ExtractionError> {
    let page = extract_article(html, &ctx.selectors.title, &ctx.selectors.content)?;
    let file_name = article_file_name(&page.title, &ctx.config.file_extension)
        .ok_or_else(|| ExtractionError::EmptyFileName(page.title.clone()))?;
    let path = article_path(&ctx.config.source_path(), ctx.run_date, &file_name);

    Ok(ArticleRecord {
        url: url.to_string(),
        title: page.title,
        body: page.body,
        file_name,
        path,
    })
}

async fn persist<S: ArticleStore>(ctx: &RunContext, store: &S, url: &Url, html: &str) -> Outcome {
    let record = match build_record(ctx, url, html) {
        Ok(record) => record,
        Err(e) => {
            warn!(%url, error = %e, "Could not extract title or content");
            return Outcome::Error;
        }
    };

    if !ctx.ledger().reserve(&record.file_name) {
        info!(file = %record.file_name, "File already exists, skipping");
        return Outcome::Skipped;
    }

    if let Some(parent) = record.path.parent() {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Error creating article directory");
            ctx.ledger().release(&record.file_name);
            return Outcome::Error;
        }
    }

    match store.save(&record.path, &record.body).await {
        Ok(()) => {
            ctx.ledger().record(&record.file_name);
            info!(
                file = %record.file_name,
                title = %record.title,
                url = %record.url,
                bytes = record.body.len(),
                "Successfully saved and validated file"
            );
            Outcome::Scraped
        }
        Err(e) => {
            error!(file = %record.file_name, error = %e, "Error saving file");
            ctx.ledger().release(&record.file_name);
            Outcome::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlerConfig;
    use crate::error::IntegrityError;
    use crate::integrity::{verify_written, write_article, VerifiedStore};
    use chrono::NaiveDate;
    use std::path::Path;

    /// Writes the file, then truncates it before the read-back.
    struct TruncatingStore;

    impl ArticleStore for TruncatingStore {
        async fn save(&self, path: &Path, content: &str) -> Result<(), IntegrityError> {
            write_article(path, content).await?;
            let half = content.len() / 2;
            std::fs::write(path, &content.as_bytes()[..half]).unwrap();
            verify_written(path, content).await
        }
    }

    const KANT: &str = r#"<h1>Kant's Ethics</h1><div id="main-text"><p>Duty.</p></div>"#;

    async fn context(base: &Path) -> RunContext {
        let config = CrawlerConfig {
            base_path: base.to_path_buf(),
            source: "sep".to_string(),
            download_delay: 0.0,
            ..CrawlerConfig::default()
        };
        RunContext::prepare(config, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
            .await
            .unwrap()
    }

    fn url() -> Url {
        Url::parse("https://plato.stanford.edu/entries/kant/").unwrap()
    }

    #[tokio::test]
    async fn test_build_record_derives_name_and_partitioned_path() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path()).await;

        let record = build_record(&ctx, &url(), KANT).unwrap();
        assert_eq!(record.file_name, "kant's_ethics.txt");
        assert_eq!(record.body, "Duty.");
        assert_eq!(
            record.path,
            tmp.path().join("sep/2024/05/01/kant's_ethics.txt")
        );
    }

    #[tokio::test]
    async fn test_scraped_then_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path()).await;

        let first = process_response(&ctx, &VerifiedStore, &url(), Ok(KANT.to_string())).await;
        let second = process_response(&ctx, &VerifiedStore, &url(), Ok(KANT.to_string())).await;

        assert_eq!(first, Outcome::Scraped);
        assert_eq!(second, Outcome::Skipped);
        assert!(ctx.ledger().contains("kant's_ethics.txt"));
        let summary = ctx.stats.snapshot();
        assert_eq!((summary.articles_scraped, summary.articles_skipped), (1, 1));
    }

    #[tokio::test]
    async fn test_malformed_page_is_error_without_file_system_access() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path()).await;
        let html = "<h1>Only a title</h1>";

        let outcome = process_response(&ctx, &VerifiedStore, &url(), Ok(html.to_string())).await;
        assert_eq!(outcome, Outcome::Error);
        assert!(!tmp.path().join("sep").exists());
        assert_eq!(ctx.stats.snapshot().errors, 1);
    }

    #[tokio::test]
    async fn test_title_of_only_illegal_characters_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path()).await;
        let html = r#"<h1>???</h1><div id="main-text">Body</div>"#;

        let outcome = process_response(&ctx, &VerifiedStore, &url(), Ok(html.to_string())).await;
        assert_eq!(outcome, Outcome::Error);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_counted() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path()).await;
        let failure = Err(FetchError::Status {
            status: 503,
            url: url().to_string(),
        });

        let outcome = process_response(&ctx, &VerifiedStore, &url(), failure).await;
        assert_eq!(outcome, Outcome::Error);
        assert_eq!(ctx.stats.snapshot().errors, 1);
    }

    #[tokio::test]
    async fn test_integrity_failure_is_not_recorded() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path()).await;

        let outcome = process_response(&ctx, &TruncatingStore, &url(), Ok(KANT.to_string())).await;
        assert_eq!(outcome, Outcome::Error);
        assert!(!ctx.ledger().contains("kant's_ethics.txt"));
        // The untrusted file stays on disk.
        assert!(tmp.path().join("sep/2024/05/01/kant's_ethics.txt").exists());

        // A later attempt is free to try again.
        let retry = process_response(&ctx, &VerifiedStore, &url(), Ok(KANT.to_string())).await;
        assert_eq!(retry, Outcome::Scraped);
    }
}
