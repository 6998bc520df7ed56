//! HTML parsing for listing pages and item pages
//!
//! This module handles:
//! - The pluggable [`Extractor`] seam that turns an item page into a [`PartialRecord`]
//! - [`HtmlExtractor`], the CSS-selector implementation driven by [`ExtractionConfig`]
//! - Generic element selection used by the static-HTML navigator
//!
//! Selector strings live in configuration; nothing here knows about a
//! particular site layout.

use crate::config::ExtractionConfig;
use crate::crawler::navigator::PageElement;
use crate::crawler::record::PartialRecord;
use crate::url::resolve_link;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Reads item fields off a fetched item page
pub trait Extractor: Send + Sync {
    /// Extracts whatever fields the page exposes
    ///
    /// `links` must hold every candidate link as an absolute URL; the caller
    /// applies the download extension filter.
    fn extract(&self, html: &str, page_url: &Url) -> PartialRecord;
}

/// Selector-driven extractor
///
/// # Abstract selection
///
/// 1. The first abstract selector (in configured order) matching an element
///    with non-empty text
/// 2. Otherwise the first `<p>` whose text is longer than `min_paragraph_chars`
/// 3. Otherwise nothing, leaving the sentinel to the record
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    title: Selector,
    date: Selector,
    author: Selector,
    abstracts: Vec<Selector>,
    paragraph: Selector,
    anchor: Selector,
    min_paragraph_chars: usize,
}

impl HtmlExtractor {
    /// Compiles the configured selectors
    pub fn new(config: &ExtractionConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            title: compile("title_selector", &config.title_selector)?,
            date: compile("date_selector", &config.date_selector)?,
            author: compile("author_selector", &config.author_selector)?,
            abstracts: config
                .abstract_selectors
                .iter()
                .map(|s| compile("abstract_selectors", s))
                .collect::<Result<Vec<_>, _>>()?,
            paragraph: compile("paragraph", "p")?,
            anchor: compile("anchor", "a[href]")?,
            min_paragraph_chars: config.min_paragraph_chars,
        })
    }

    fn select_abstract(&self, document: &Html) -> Option<String> {
        let primary = self
            .abstracts
            .iter()
            .find_map(|selector| first_text(document, selector));

        primary.or_else(|| {
            document
                .select(&self.paragraph)
                .map(element_text)
                .find(|text| text.chars().count() > self.min_paragraph_chars)
        })
    }

    fn collect_links(&self, document: &Html, page_url: &Url) -> Vec<String> {
        document
            .select(&self.anchor)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| resolve_link(href, page_url))
            .map(|url| url.to_string())
            .collect()
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, html: &str, page_url: &Url) -> PartialRecord {
        let document = Html::parse_document(html);

        PartialRecord {
            title: first_text(&document, &self.title),
            links: self.collect_links(&document, page_url),
            date_published: first_text(&document, &self.date),
            authors: first_text(&document, &self.author),
            abstract_text: self.select_abstract(&document),
        }
    }
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        field,
        selector: selector.to_string(),
    })
}

/// Text of an element with each text node trimmed and joined by single spaces
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first element matching `selector`, if non-empty
fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

/// Selects elements from an HTML document as navigable page elements
///
/// An element's href is its own `href` attribute or, failing that, the first
/// descendant anchor's, resolved against `base_url`. An unparsable selector
/// yields no elements.
pub fn select_elements(html: &str, base_url: &Url, selector: &str) -> Vec<PageElement> {
    let selector = match Selector::parse(selector) {
        Ok(s) => s,
        Err(_) => {
            tracing::warn!("Ignoring unparsable selector: {}", selector);
            return Vec::new();
        }
    };
    let anchor = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let document = Html::parse_document(html);
    document
        .select(&selector)
        .map(|element| {
            let href = element
                .value()
                .attr("href")
                .or_else(|| {
                    element
                        .select(&anchor)
                        .next()
                        .and_then(|a| a.value().attr("href"))
                })
                .and_then(|href| resolve_link(href, base_url))
                .map(|url| url.to_string());

            PageElement {
                text: element_text(element),
                href,
            }
        })
        .collect()
}

/// Returns true if `selector` matches at least one element of `html`
pub fn contains_selector(html: &str, selector: &str) -> bool {
    match Selector::parse(selector) {
        Ok(selector) => Html::parse_document(html).select(&selector).next().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::record::ABSTRACT_NOT_FOUND;

    fn page_url() -> Url {
        Url::parse("https://example.com/library/working-papers/2024/wp-01.html").unwrap()
    }

    fn extractor() -> HtmlExtractor {
        HtmlExtractor::new(&ExtractionConfig::default()).unwrap()
    }

    const LONG_PARAGRAPH: &str =
        "This paragraph is comfortably longer than fifty characters in total length.";

    #[test]
    fn test_extracts_all_fields() {
        let html = r#"
            <html><body>
              <h1 class="cmp-title__text">  Measuring Migration  </h1>
              <time itemprop="datePublished">March 2024</time>
              <div itemprop="author">Jane Doe, John Roe</div>
              <div class="cmp-text"><p>Primary abstract text.</p></div>
              <a href="/files/wp-01.pdf">PDF</a>
              <a href="tables.xlsx">Tables</a>
            </body></html>
        "#;

        let partial = extractor().extract(html, &page_url());
        assert_eq!(partial.title.as_deref(), Some("Measuring Migration"));
        assert_eq!(partial.date_published.as_deref(), Some("March 2024"));
        assert_eq!(partial.authors.as_deref(), Some("Jane Doe, John Roe"));
        assert_eq!(partial.abstract_text.as_deref(), Some("Primary abstract text."));
        assert_eq!(
            partial.links,
            vec![
                "https://example.com/files/wp-01.pdf",
                "https://example.com/library/working-papers/2024/tables.xlsx",
            ]
        );
    }

    #[test]
    fn test_missing_fields_are_none() {
        let partial = extractor().extract("<html><body></body></html>", &page_url());
        assert_eq!(partial, PartialRecord::default());
    }

    #[test]
    fn test_abstract_priority_order() {
        let html = r#"
            <div class="cmp-text">Second choice</div>
            <div class="uscb-text-image-text">First choice</div>
        "#;
        let partial = extractor().extract(html, &page_url());
        assert_eq!(partial.abstract_text.as_deref(), Some("First choice"));
    }

    #[test]
    fn test_primary_abstract_beats_short_paragraphs() {
        let html = r#"
            <p>Too short.</p>
            <p>Also short.</p>
            <div class="cmp-text">The real abstract</div>
        "#;
        let partial = extractor().extract(html, &page_url());
        assert_eq!(partial.abstract_text.as_deref(), Some("The real abstract"));
    }

    #[test]
    fn test_abstract_falls_back_to_long_paragraph() {
        let html = format!(
            "<p>Short one.</p><p>{}</p><p>{} again</p>",
            LONG_PARAGRAPH, LONG_PARAGRAPH
        );
        let partial = extractor().extract(&html, &page_url());
        assert_eq!(partial.abstract_text.as_deref(), Some(LONG_PARAGRAPH));
    }

    #[test]
    fn test_abstract_paragraph_must_exceed_minimum() {
        let exactly_fifty = "a".repeat(50);
        let html = format!("<p>{}</p>", exactly_fifty);
        let partial = extractor().extract(&html, &page_url());
        assert_eq!(partial.abstract_text, None);

        let record = crate::crawler::DetailRecord::from_partial(partial, Vec::new());
        assert_eq!(record.abstract_text, ABSTRACT_NOT_FOUND);
    }

    #[test]
    fn test_empty_primary_container_is_skipped() {
        let html = format!(
            r#"<div class="uscb-text-image-text">   </div><p>{}</p>"#,
            LONG_PARAGRAPH
        );
        let partial = extractor().extract(&html, &page_url());
        assert_eq!(partial.abstract_text.as_deref(), Some(LONG_PARAGRAPH));
    }

    #[test]
    fn test_select_elements_with_own_and_nested_href() {
        let html = r#"
            <a class="item" href="/papers/one.html">  One </a>
            <div class="item"><a href="two.html">Two</a></div>
            <div class="item">Three</div>
        "#;
        let base = Url::parse("https://example.com/papers/index.html").unwrap();
        let elements = select_elements(html, &base, ".item");

        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].text, "One");
        assert_eq!(
            elements[0].href.as_deref(),
            Some("https://example.com/papers/one.html")
        );
        assert_eq!(
            elements[1].href.as_deref(),
            Some("https://example.com/papers/two.html")
        );
        assert_eq!(elements[2].href, None);
    }

    #[test]
    fn test_contains_selector() {
        let html = r#"<div class="marker">x</div>"#;
        assert!(contains_selector(html, ".marker"));
        assert!(!contains_selector(html, ".missing"));
        assert!(!contains_selector(html, "div["));
    }
}
