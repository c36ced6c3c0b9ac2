//! Sitemap parsing
//!
//! Sitemaps are used for link discovery only. Both `<urlset>` documents and
//! `<sitemapindex>` documents are understood; `<loc>` entries are read with
//! the standard sitemap namespace, falling back to unnamespaced documents.

use sxd_document::{dom, parser};
use sxd_xpath::{Context, Factory, Value};
use thiserror::Error;

const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Errors raised while reading a sitemap document
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Failed to parse sitemap XML: {0}")]
    Xml(String),

    #[error("Failed to evaluate sitemap XPath: {0}")]
    XPath(String),

    #[error("Unknown sitemap root element '{0}'")]
    UnknownRoot(String),
}

/// The two kinds of sitemap document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    /// Lists other sitemap documents
    Index,
    /// Lists page URLs
    Urlset,
}

impl SitemapKind {
    fn from_root(root: &dom::Root) -> Result<Self, SitemapError> {
        let element = root
            .children()
            .into_iter()
            .find_map(|child| child.element())
            .ok_or_else(|| SitemapError::UnknownRoot(String::new()))?;

        match element.name().local_part() {
            "sitemapindex" => Ok(Self::Index),
            "urlset" => Ok(Self::Urlset),
            other => Err(SitemapError::UnknownRoot(other.to_string())),
        }
    }
}

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sitemap {
    pub kind: SitemapKind,
    /// `<loc>` values in document order, trimmed
    pub locations: Vec<String>,
}

/// Parses a sitemap document
///
/// # Example
///
/// ```
/// use site_audit::crawler::{parse_sitemap, SitemapKind};
///
/// let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
/// <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <url><loc>https://example.com/about</loc></url>
/// </urlset>"#;
///
/// let sitemap = parse_sitemap(xml).unwrap();
/// assert_eq!(sitemap.kind, SitemapKind::Urlset);
/// assert_eq!(sitemap.locations, vec!["https://example.com/about".to_string()]);
/// ```
pub fn parse_sitemap(xml: &str) -> Result<Sitemap, SitemapError> {
    let package = parser::parse(xml.trim_start()).map_err(|e| SitemapError::Xml(e.to_string()))?;
    let document = package.as_document();
    let kind = SitemapKind::from_root(&document.root())?;

    let mut locations = select_locations(&document, "//sm:loc")?;
    if locations.is_empty() {
        locations = select_locations(&document, "//*[local-name()='loc']")?;
    }

    Ok(Sitemap { kind, locations })
}

fn select_locations(
    document: &dom::Document,
    expression: &str,
) -> Result<Vec<String>, SitemapError> {
    let factory = Factory::new();
    let xpath = factory
        .build(expression)
        .map_err(|e| SitemapError::XPath(e.to_string()))?
        .ok_or_else(|| SitemapError::XPath(format!("Empty expression {}", expression)))?;

    let mut context = Context::new();
    context.set_namespace("sm", SITEMAP_NAMESPACE);

    let value = xpath
        .evaluate(&context, document.root())
        .map_err(|e| SitemapError::XPath(e.to_string()))?;

    let locations = match value {
        Value::Nodeset(nodes) => nodes
            .document_order()
            .into_iter()
            .map(|node| node.string_value().trim().to_string())
            .filter(|loc| !loc.is_empty())
            .collect(),
        _ => Vec::new(),
    };

    Ok(locations)
}
