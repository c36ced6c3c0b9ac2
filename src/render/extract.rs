//! Snapshot extraction from a rendered HTML document
//!
//! This module turns the final DOM of a page into a [`PageSnapshot`]:
//! - Title and meta description
//! - H1 and H2 heading text
//! - Image counts, including images without alt text
//! - Internal and external link counts, plus link targets for discovery
//! - Length of the visible body text

use crate::render::{NavigationResult, PageSnapshot};
use crate::url::extract_domain;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text never reaches the reader
const NON_CONTENT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Builds a snapshot from a rendered document
///
/// # Arguments
///
/// * `html` - The final document source
/// * `page_url` - The URL the page was requested under
/// * `navigation` - Status and timing of the navigation that loaded the document
///
/// # Example
///
/// ```
/// use site_audit::render::{extract_snapshot, NavigationResult};
/// use url::Url;
///
/// let url = Url::parse("https://example.com/").unwrap();
/// let nav = NavigationResult { status_code: 200, elapsed_ms: 120, final_url: url.clone() };
/// let html = r#"<html><head><title>Home</title></head><body><h1>Hi</h1></body></html>"#;
/// let snapshot = extract_snapshot(html, &url, &nav);
/// assert_eq!(snapshot.title.as_deref(), Some("Home"));
/// assert_eq!(snapshot.h1, vec!["Hi".to_string()]);
/// ```
pub fn extract_snapshot(html: &str, page_url: &Url, navigation: &NavigationResult) -> PageSnapshot {
    let document = Html::parse_document(html);
    let base_url = &navigation.final_url;

    let mut snapshot = PageSnapshot::new(page_url.as_str());
    snapshot.title = extract_title(&document);
    snapshot.meta_description = extract_meta_description(&document);
    snapshot.h1 = heading_texts(&document, "h1");
    snapshot.h2 = heading_texts(&document, "h2");

    let images = select_all(&document, "img");
    snapshot.image_count = images.len() as u32;
    snapshot.images_without_alt = images
        .iter()
        .filter(|img| {
            img.value()
                .attr("alt")
                .map_or(true, |alt| alt.trim().is_empty())
        })
        .count() as u32;

    let page_host = extract_domain(base_url);
    for anchor in select_all(&document, "a[href]") {
        let Some(target) = anchor.value().attr("href").and_then(|h| resolve_link(h, base_url))
        else {
            continue;
        };

        if extract_domain(&target) == page_host {
            snapshot.internal_links += 1;
        } else {
            snapshot.external_links += 1;
        }

        // Download links are counted but never crawled
        if anchor.value().attr("download").is_none() {
            snapshot.links.push(target.to_string());
        }
    }

    snapshot.content_length = body_text_length(&document);
    snapshot.load_time_ms = navigation.elapsed_ms;
    snapshot.status_code = navigation.status_code;

    snapshot
}

/// Selects every element matching `css`, or nothing if the selector is invalid
fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    select_all(document, "title")
        .first()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_meta_description(document: &Html) -> Option<String> {
    select_all(document, "meta[name]")
        .into_iter()
        .find(|meta| {
            meta.value()
                .attr("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("description"))
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn heading_texts(document: &Html, tag: &str) -> Vec<String> {
    select_all(document, tag)
        .into_iter()
        .map(|heading| heading.text().collect::<String>().trim().to_string())
        .collect()
}

/// Counts the characters of body text, skipping anything inside a non-content element
fn body_text_length(document: &Html) -> usize {
    let Some(body) = select_all(document, "body").into_iter().next() else {
        return 0;
    };

    body.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| NON_CONTENT_ELEMENTS.contains(&element.name()))
            });
            (!hidden).then(|| text.chars().count())
        })
        .sum()
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    matches!(absolute_url.scheme(), "http" | "https").then_some(absolute_url)
}
