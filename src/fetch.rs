//! Page fetching with a politeness delay.
//!
//! # Architecture
//!
//! - [`PageFetcher`]: core trait, "give me the body of this URL"
//! - [`HttpFetcher`]: `reqwest` implementation sending the configured User-Agent
//! - [`Polite`]: decorator that spaces out dispatches to any [`PageFetcher`]
//!
//! The delay is a contract with the remote host. [`Polite`] never dispatches
//! two requests closer together than the configured minimum, no matter how
//! many requests are in flight; a random 0-250ms jitter is added on top.

use crate::config::CrawlerConfig;
use crate::error::FetchError;
use rand::{rng, Rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};
use url::Url;

/// Something that can retrieve the body of a page.
pub trait PageFetcher {
    /// Fetch `url` and return its body as text.
    ///
    /// Non-success statuses are errors.
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// HTTP fetcher backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with the configured User-Agent and timeout.
    pub fn new(config: &CrawlerConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self), fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Non-success response");
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

/// Wrapper that enforces a minimum delay between dispatches.
///
/// The dispatch slot is held while waiting, so concurrent callers queue up
/// behind each other and each one observes the full delay.
pub struct Polite<T> {
    inner: T,
    delay: Duration,
    max_jitter: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl<T> Polite<T>
where
    T: PageFetcher,
{
    pub fn new(inner: T, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            max_jitter: Duration::from_millis(250),
            last_dispatch: Mutex::new(None),
        }
    }

    /// Wait until the next dispatch is allowed, then claim the slot.
    async fn wait_turn(&self) {
        let mut last = self.last_dispatch.lock().await;
        if let Some(previous) = *last {
            let mut gap = self.delay;
            if !self.delay.is_zero() {
                let jitter_ms: u64 = rng().random_range(0..=self.max_jitter.as_millis() as u64);
                gap += Duration::from_millis(jitter_ms);
            }
            let elapsed = previous.elapsed();
            if elapsed < gap {
                let wait = gap - elapsed;
                debug!(?wait, "Waiting before next request");
                sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl<T> fmt::Debug for Polite<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polite")
            .field("delay", &self.delay)
            .field("max_jitter", &self.max_jitter)
            .finish()
    }
}

impl<T> PageFetcher for Polite<T>
where
    T: PageFetcher,
{
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.wait_turn().await;
        self.inner.fetch(url).await
    }
}
