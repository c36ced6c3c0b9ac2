use std::net::IpAddr;
use url::Url;

/// Extracts the host from a URL, lowercased
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_audit::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Second-level labels that act as public suffixes under a country code
const MULTI_LABEL_SUFFIXES: &[&str] = &[
    "ac.uk", "co.uk", "gov.uk", "org.uk", "me.uk", "com.au", "net.au", "org.au", "co.nz",
    "org.nz", "co.jp", "ne.jp", "or.jp", "co.in", "co.za", "com.br", "com.cn", "com.mx",
    "com.tr", "co.kr",
];

/// Reduces a host to its registrable domain
///
/// The registrable domain is the public suffix plus one label: the last two
/// labels of the host, or the last three when the last two form a known
/// country-code suffix such as `co.uk`. IP addresses and single-label hosts
/// are returned whole. The host is lowercased and a trailing dot is dropped.
///
/// ```
/// use site_audit::url::registrable_domain;
///
/// assert_eq!(registrable_domain("WWW.Example.com"), "example.com");
/// assert_eq!(registrable_domain("blog.example.com"), "example.com");
/// assert_eq!(registrable_domain("shop.example.co.uk"), "example.co.uk");
/// ```
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    if host.starts_with('[') || host.parse::<IpAddr>().is_ok() {
        return host;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }

    let last_two = labels[labels.len() - 2..].join(".");
    let keep = if MULTI_LABEL_SUFFIXES.contains(&last_two.as_str()) {
        3
    } else {
        2
    };
    labels[labels.len() - keep..].join(".")
}

/// Checks whether `host` shares the site's registrable domain
///
/// `www.example.com`, `blog.example.com` and `example.com` all belong to the
/// same site.
pub fn is_same_site(site_domain: &str, host: &str) -> bool {
    let site = registrable_domain(site_domain);
    if site.is_empty() {
        return false;
    }

    registrable_domain(host) == site
}
