//! Article page extraction.
//!
//! An article page exposes one heading (the title) and one content container
//! whose descendant text nodes form the body. Pages of any other shape are
//! reported as [`ExtractionError`]s, never panics.

use crate::error::ExtractionError;
use scraper::{Html, Selector};

/// Title and body text of an article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub title: String,
    pub body: String,
}

/// Pull the title and body out of `html`.
///
/// The title is the text of the first `title_selector` match. The body joins
/// every non-blank descendant text node of every `content_selector` match with
/// a single space.
pub fn extract_article(
    html: &str,
    title_selector: &Selector,
    content_selector: &Selector,
) -> Result<PageContent, ExtractionError> {
    let document = Html::parse_document(html);

    let title = document
        .select(title_selector)
        .next()
        .map(|heading| heading.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    if title.is_empty() {
        return Err(ExtractionError::MissingTitle);
    }

    let body = document
        .select(content_selector)
        .flat_map(|container| container.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if body.is_empty() {
        return Err(ExtractionError::MissingBody);
    }

    Ok(PageContent { title, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors() -> (Selector, Selector) {
        (
            Selector::parse("h1").unwrap(),
            Selector::parse("div#main-text").unwrap(),
        )
    }

    #[test]
    fn test_extract_title_and_nested_body() {
        let html = r#"
            <html><body>
              <h1>Kant's Moral Philosophy</h1>
              <div id="main-text">
                <h2>1. Aims and Methods</h2>
                <p>Kant's central <em>ethical</em> claim.</p>
                <p>   </p>
              </div>
              <div id="footer">Not included</div>
            </body></html>
        "#;
        let (title, content) = selectors();

        let page = extract_article(html, &title, &content).unwrap();
        assert_eq!(page.title, "Kant's Moral Philosophy");
        assert_eq!(
            page.body,
            "1. Aims and Methods Kant's central ethical claim."
        );
    }

    #[test]
    fn test_missing_title() {
        let html = r#"<div id="main-text"><p>Body only</p></div>"#;
        let (title, content) = selectors();
        assert_eq!(
            extract_article(html, &title, &content),
            Err(ExtractionError::MissingTitle)
        );
    }

    #[test]
    fn test_blank_title_counts_as_missing() {
        let html = r#"<h1>   </h1><div id="main-text"><p>Body</p></div>"#;
        let (title, content) = selectors();
        assert_eq!(
            extract_article(html, &title, &content),
            Err(ExtractionError::MissingTitle)
        );
    }

    #[test]
    fn test_missing_body() {
        let html = r#"<h1>Hume</h1><div id="preamble"><p>Intro</p></div>"#;
        let (title, content) = selectors();
        assert_eq!(
            extract_article(html, &title, &content),
            Err(ExtractionError::MissingBody)
        );
    }

    #[test]
    fn test_non_html_input_is_an_extraction_error() {
        let (title, content) = selectors();
        assert!(extract_article("%PDF-1.7 binary junk", &title, &content).is_err());
    }
}
