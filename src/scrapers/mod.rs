//! Scraping for the one page topology this crawler understands.
//!
//! The target site is crawled in two phases:
//!
//! 1. **Indexing** ([`index`]): fetch the index page and turn its anchors into
//!    an ordered, de-duplicated list of article URLs
//! 2. **Extraction** ([`article`]): pull the title and body text out of each
//!    fetched article page
//!
//! Both phases are driven by CSS selectors from the run configuration, compiled
//! once into [`Selectors`].

pub mod article;
pub mod index;

use crate::config::CrawlerConfig;
use crate::error::ConfigError;
use scraper::Selector;

/// Compiled CSS selectors for a run.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub link: Selector,
    pub title: Selector,
    pub content: Selector,
}

impl Selectors {
    pub fn compile(config: &CrawlerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            link: parse("link_selector", &config.link_selector)?,
            title: parse("title_selector", &config.title_selector)?,
            content: parse("content_selector", &config.content_selector)?,
        })
    }
}

fn parse(field: &'static str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::Invalid {
        field,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_default_selectors() {
        assert!(Selectors::compile(&CrawlerConfig::default()).is_ok());
    }

    #[test]
    fn test_compile_rejects_invalid_selector() {
        let config = CrawlerConfig {
            title_selector: "h1[".to_string(),
            ..CrawlerConfig::default()
        };
        assert!(matches!(
            Selectors::compile(&config),
            Err(ConfigError::Invalid { field: "title_selector", .. })
        ));
    }
}
