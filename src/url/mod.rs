//! URL handling module for Site-Audit
//!
//! This module provides URL normalization, host extraction, and the
//! same-site scoping used by the crawl frontier.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_same_site, registrable_domain};
pub use normalize::normalize_url;

use crate::{UrlError, UrlResult};
use url::Url;

/// Path of the sitemap endpoint relative to the site root
pub const SITEMAP_PATH: &str = "/sitemap.xml";

/// Resolves the root URL of a site from the domain given to a crawl
///
/// A bare host such as `example.com` is crawled over HTTPS. A full origin such
/// as `http://127.0.0.1:8080` keeps its scheme and port. Any path on the input
/// is discarded.
///
/// # Examples
///
/// ```
/// use site_audit::url::site_root;
///
/// assert_eq!(site_root("example.com").unwrap().as_str(), "https://example.com/");
/// assert_eq!(
///     site_root("http://localhost:3000/blog").unwrap().as_str(),
///     "http://localhost:3000/"
/// );
/// ```
pub fn site_root(domain: &str) -> UrlResult<Url> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(UrlError::MissingDomain);
    }

    let candidate = if domain.contains("://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    };

    let mut root = normalize_url(&candidate)?;
    root.set_path("/");
    root.set_query(None);
    Ok(root)
}

/// Returns the sitemap endpoint for a site root
pub fn sitemap_url(root: &Url) -> UrlResult<Url> {
    root.join(SITEMAP_PATH)
        .map_err(|e| UrlError::Malformed(format!("Failed to build sitemap URL: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_root_from_bare_host() {
        let root = site_root("Example.com").unwrap();
        assert_eq!(root.as_str(), "https://example.com/");
    }

    #[test]
    fn test_site_root_keeps_origin_scheme_and_port() {
        let root = site_root("http://127.0.0.1:9000").unwrap();
        assert_eq!(root.as_str(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn test_site_root_drops_path_and_query() {
        let root = site_root("https://example.com/shop?page=2").unwrap();
        assert_eq!(root.as_str(), "https://example.com/");
    }

    #[test]
    fn test_site_root_rejects_empty() {
        assert!(matches!(site_root("  "), Err(UrlError::MissingDomain)));
    }

    #[test]
    fn test_site_root_rejects_other_schemes() {
        assert!(site_root("ftp://example.com").is_err());
    }

    #[test]
    fn test_sitemap_url() {
        let root = site_root("example.com").unwrap();
        assert_eq!(
            sitemap_url(&root).unwrap().as_str(),
            "https://example.com/sitemap.xml"
        );
    }
}
