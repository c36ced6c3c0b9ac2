//! Shared fixtures for the integration tests

use site_audit::config::{Config, CrawlerConfig, OutputConfig, SitemapMode, UserAgentConfig};
use site_audit::crawler::Coordinator;
use site_audit::render::HttpEngineLauncher;
use site_audit::storage::SqliteStorage;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing to `db_path`
pub fn create_test_config(db_path: &str, sitemap: SitemapMode) -> Config {
    Config {
        crawler: CrawlerConfig {
            navigation_timeout_ms: 5_000,
            sitemap,
            ..CrawlerConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
            report_path: None,
        },
    }
}

/// A coordinator backed by a SQLite file in a temporary directory
pub struct TestCrawl {
    pub coordinator: Coordinator<SqliteStorage>,
    pub storage: Arc<Mutex<SqliteStorage>>,
    pub dir: TempDir,
}

pub fn create_test_crawl(sitemap: SitemapMode) -> TestCrawl {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("audit.db");
    let config = create_test_config(&db_path.to_string_lossy(), sitemap);

    let storage = Arc::new(Mutex::new(
        SqliteStorage::new(&db_path).expect("Failed to open storage"),
    ));
    let launcher = Arc::new(HttpEngineLauncher::new(&config.user_agent));
    let coordinator =
        Coordinator::new(config, Arc::clone(&storage), launcher).with_config_hash("test-hash");

    TestCrawl {
        coordinator,
        storage,
        dir,
    }
}

/// Builds an HTML page that passes every on-page rule, linking to `links`
pub fn healthy_html(links: &[&str]) -> String {
    page_html(
        Some("Integration Test Store - Quality Goods"),
        "Welcome to the store",
        links,
    )
}

/// Builds an HTML page with the given title and H1 (None omits the element)
pub fn page_html(title: Option<&str>, h1: &str, links: &[&str]) -> String {
    let title = title
        .map(|t| format!("<title>{}</title>", t))
        .unwrap_or_default();
    let h1 = if h1.is_empty() {
        String::new()
    } else {
        format!("<h1>{}</h1>", h1)
    };
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{}\">link</a>", href))
        .collect();
    let paragraph = "Our shop offers carefully selected goods for every season. ".repeat(8);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
{title}
<meta name="description" content="Quality goods delivered straight to your door.">
</head>
<body>
{h1}
<p>{paragraph}</p>
{anchors}
</body>
</html>"#
    )
}

/// Serves `html` at `route`
pub async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}
