//! Index page crawling: discover the article URLs to fetch.
//!
//! # URL handling
//!
//! Relative `href`s are resolved against the index URL. Only `http(s)` links
//! whose host is in the allowed domain list (or a subdomain of one) are kept.
//! Fragments are stripped and repeated URLs dropped, so every article page is
//! requested at most once per run, in first-discovery order. Links back to the
//! index page itself are dropped too.

use crate::error::{CrawlError, FetchError};
use crate::fetch::PageFetcher;
use crate::utils::truncate_for_log;
use itertools::Itertools;
use scraper::{Html, Selector};
use tracing::{debug, error, info, instrument};
use url::Url;

/// Fetch the index page and return the article URLs it links to.
///
/// Any failure here ends the run: without the index there is nothing to crawl.
#[instrument(level = "info", skip(fetcher, link_selector, allowed_domains))]
pub async fn index_articles<F: PageFetcher>(
    fetcher: &F,
    index_url: &str,
    link_selector: &Selector,
    allowed_domains: &[String],
) -> Result<Vec<Url>, CrawlError> {
    let fatal = |source| CrawlError::Index {
        url: index_url.to_string(),
        source,
    };

    let base = Url::parse(index_url).map_err(|_| fatal(FetchError::InvalidUrl(index_url.to_string())))?;

    info!("Parsing main page");
    let html = match fetcher.fetch(&base).await {
        Ok(html) => html,
        Err(e) => {
            error!(error = %e, "Index page fetch failed");
            return Err(fatal(e));
        }
    };
    debug!(html = %truncate_for_log(&html, 500), "Index page content");

    let urls = discover_links(&html, &base, link_selector, allowed_domains);
    info!(count = urls.len(), "Found links on the main page");
    Ok(urls)
}

/// Extract, resolve, filter and de-duplicate the links in `html`.
pub fn discover_links(
    html: &str,
    base: &Url,
    link_selector: &Selector,
    allowed_domains: &[String],
) -> Vec<Url> {
    let mut index = base.clone();
    index.set_fragment(None);

    let document = Html::parse_document(html);
    document
        .select(link_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .filter(|url| is_allowed(url, allowed_domains))
        .map(|mut url| {
            url.set_fragment(None);
            url
        })
        .filter(|url| *url != index)
        .unique()
        .collect()
}

/// Whether `url` points at one of `allowed_domains` or a subdomain of one.
pub fn is_allowed(url: &Url, allowed_domains: &[String]) -> bool {
    if allowed_domains.is_empty() {
        return true;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    allowed_domains.iter().any(|domain| {
        host.eq_ignore_ascii_case(domain)
            || host
                .to_ascii_lowercase()
                .ends_with(&format!(".{}", domain.to_ascii_lowercase()))
    })
}
