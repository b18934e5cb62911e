//! HTML link extraction
//!
//! This module handles parsing HTML content to find the links the crawler
//! should follow next. Only links on the same host as the page they were
//! found on are returned.

use crate::url::{resolve_reference, same_host};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Finds follow-up links in fetched page content
///
/// Implementations resolve relative references against `base_url`, drop
/// anything that does not resolve to a well-formed absolute URL, and keep
/// only links whose host equals the host of `base_url`.
pub trait LinkExtractor: Send + Sync {
    fn extract(&self, base_url: &Url, html: &str) -> HashSet<String>;
}

/// [`LinkExtractor`] backed by a real HTML parser
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, base_url: &Url, html: &str) -> HashSet<String> {
        extract_links(html, base_url)
            .into_iter()
            .filter(|link| same_host(link, base_url))
            .map(String::from)
            .collect()
    }
}

/// Extracts all valid links from an HTML document, on any host
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
/// - References that are not well formed
///
/// # Example
///
/// ```
/// use keyword_crawler::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base_url);
/// assert_eq!(links[0].as_str(), "https://example.com/page");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_reference(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_reference(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}
