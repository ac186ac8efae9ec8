//! HTML parser for extracting links and matching content
//!
//! This module handles:
//! - The `LinkExtractor` capability the layer executor depends on
//! - Extracting absolute anchor links with `scraper`
//! - Testing page content for the searched text

use scraper::{Html, Selector};
use url::Url;

/// Extracts outbound links from page content
///
/// Implementations hold no state and may be called concurrently.
pub trait LinkExtractor: Send + Sync {
    /// Returns the linked URLs in document order
    fn extract_links(&self, content: &str) -> Result<Vec<String>, String>;
}

/// [`LinkExtractor`] that reads `<a href>` elements
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` whose href is an absolute `http` or `https` URL
///
/// **Exclude:**
/// - relative hrefs (there is no base to resolve them against)
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:`, `data:` links
///
/// Hrefs are returned trimmed but otherwise exactly as written, so two
/// spellings of the same address count as two URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, content: &str) -> Result<Vec<String>, String> {
        let anchor = Selector::parse("a[href]").map_err(|e| e.to_string())?;
        let document = Html::parse_document(content);
        let mut links = Vec::new();

        for element in document.select(&anchor) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(link) = element.value().attr("href").and_then(absolute_link) {
                links.push(link);
            }
        }

        Ok(links)
    }
}

/// Returns the href if it is an absolute http(s) URL
fn absolute_link(href: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    match Url::parse(href) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(href.to_string()),
        _ => None,
    }
}

/// Returns true iff `needle` occurs at least once in `content`
///
/// Plain case-sensitive substring search.
pub fn page_matches(content: &str, needle: &str) -> bool {
    content.contains(needle)
}
