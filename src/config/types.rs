use serde::Deserialize;

/// Main configuration structure for Site-Audit
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Default page budget for a crawl (overridable per crawl)
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Time allowed for a single page navigation (milliseconds)
    #[serde(
        rename = "navigation-timeout-ms",
        default = "default_navigation_timeout_ms"
    )]
    pub navigation_timeout_ms: u64,

    /// Condition a navigation waits for before the page is extracted
    #[serde(rename = "wait-until", default)]
    pub wait_until: WaitCondition,

    /// How the sitemap endpoint is used
    #[serde(default)]
    pub sitemap: SitemapMode,

    /// Whether links found on audited pages are fed back into the frontier
    #[serde(rename = "follow-links", default = "default_follow_links")]
    pub follow_links: bool,

    /// Maximum number of sitemap documents fetched when following a sitemap index
    #[serde(rename = "max-sitemap-files", default = "default_max_sitemap_files")]
    pub max_sitemap_files: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            wait_until: WaitCondition::default(),
            sitemap: SitemapMode::default(),
            follow_links: default_follow_links(),
            max_sitemap_files: default_max_sitemap_files(),
        }
    }
}

fn default_max_pages() -> u32 {
    50
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_follow_links() -> bool {
    true
}

fn default_max_sitemap_files() -> u32 {
    10
}

/// Page readiness condition for a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitCondition {
    /// The load event has fired
    Load,
    /// The initial document has been parsed
    DomContentLoaded,
    /// The network has been quiet for a short while
    #[default]
    NetworkIdle,
}

/// Treatment of the `/sitemap.xml` endpoint during a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SitemapMode {
    /// Read the sitemap for link discovery only; it is never audited as a page
    #[default]
    Discover,
    /// Queue the sitemap URL and audit it like any other page
    Page,
    /// Ignore the sitemap
    Off,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown audit report
    #[serde(rename = "report-path", default)]
    pub report_path: Option<String>,
}
