//! Integration tests for the crawler
//!
//! These tests serve a small site from a wiremock server, crawl it through
//! the HTTP render engine, and check what lands in the SQLite store.

use crate::support::{create_test_crawl, healthy_html, mount_page, page_html};
use site_audit::audit::IssueType;
use site_audit::config::SitemapMode;
use site_audit::crawler::{rescore_site, CrawlOutcome};
use site_audit::output::write_markdown_report;
use site_audit::storage::{IssueStore, RunStatus};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_full_crawl_records_issues_and_scores() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        healthy_html(&["/about", "https://elsewhere.example.org/page"]),
    )
    .await;
    mount_page(
        &server,
        "/about",
        page_html(Some("About the Integration Test Store Team"), "", &["/"]),
    )
    .await;

    let crawl = create_test_crawl(SitemapMode::Discover);
    let outcome = crawl.coordinator.start_crawl("site-1", &base, 10).await;

    assert_eq!(
        outcome,
        CrawlOutcome::Completed {
            health_score: 90,
            pages_visited: 2,
            issues_recorded: 1,
        }
    );

    let storage = crawl.storage.lock().unwrap();
    let issues = storage.list_issues("site-1", true).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].issue_type, IssueType::MissingH1);
    assert_eq!(issues[0].page_url, format!("{}/about", base));

    let site = storage.get_site("site-1").unwrap().unwrap();
    assert_eq!(site.domain, base);
    assert_eq!(site.health_score, Some(90));
    assert!(site.last_crawled_at.is_some());

    let runs = storage.list_runs("site-1").unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Completed);
    assert_eq!(runs[0].pages_visited, 2);
    assert_eq!(runs[0].health_score, Some(90));
}

#[tokio::test]
async fn test_broken_page_becomes_crawl_error() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", healthy_html(&["/missing"])).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let crawl = create_test_crawl(SitemapMode::Off);
    let outcome = crawl.coordinator.start_crawl("site-1", &base, 10).await;

    assert_eq!(outcome.health_score(), Some(90));

    let storage = crawl.storage.lock().unwrap();
    let issues = storage.list_issues("site-1", true).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].issue_type, IssueType::CrawlError);
    assert_eq!(issues[0].page_url, format!("{}/missing", base));
    assert!(issues[0].description.contains("404"));
}

#[tokio::test]
async fn test_sitemap_feeds_frontier_without_being_audited() {
    let server = MockServer::start().await;
    let base = server.uri();

    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/a</loc></url>
  <url><loc>{base}/b</loc></url>
  <url><loc>https://elsewhere.example.org/c</loc></url>
</urlset>"#
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sitemap, "application/xml"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", healthy_html(&[])).await;
    mount_page(&server, "/a", healthy_html(&[])).await;
    mount_page(&server, "/b", page_html(None, "Product B", &[])).await;

    let crawl = create_test_crawl(SitemapMode::Discover);
    let outcome = crawl.coordinator.start_crawl("site-1", &base, 10).await;

    assert_eq!(
        outcome,
        CrawlOutcome::Completed {
            health_score: 80,
            pages_visited: 3,
            issues_recorded: 1,
        }
    );

    let storage = crawl.storage.lock().unwrap();
    let issues = storage.list_issues("site-1", false).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].issue_type, IssueType::MissingTitle);
    assert_eq!(issues[0].page_url, format!("{}/b", base));
}

#[tokio::test]
async fn test_budget_limits_pages_visited() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links = ["/p1", "/p2", "/p3", "/p4", "/p5"];
    mount_page(&server, "/", healthy_html(&links)).await;
    for link in links {
        mount_page(&server, link, healthy_html(&[])).await;
    }

    let crawl = create_test_crawl(SitemapMode::Off);
    let outcome = crawl.coordinator.start_crawl("site-1", &base, 3).await;

    assert_eq!(
        outcome,
        CrawlOutcome::Completed {
            health_score: 100,
            pages_visited: 3,
            issues_recorded: 0,
        }
    );

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 3);
}

#[tokio::test]
async fn test_zero_budget_scores_without_requests() {
    let server = MockServer::start().await;

    let crawl = create_test_crawl(SitemapMode::Discover);
    let outcome = crawl.coordinator.start_crawl("site-1", &server.uri(), 0).await;

    assert_eq!(
        outcome,
        CrawlOutcome::Completed {
            health_score: 100,
            pages_visited: 0,
            issues_recorded: 0,
        }
    );
    assert!(server.received_requests().await.unwrap().is_empty());

    let storage = crawl.storage.lock().unwrap();
    let site = storage.get_site("site-1").unwrap().unwrap();
    assert!(site.last_crawled_at.is_some());
    assert_eq!(site.health_score, Some(100));
}

#[tokio::test]
async fn test_report_and_rescore_after_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", page_html(Some("Home"), "", &[])).await;

    let crawl = create_test_crawl(SitemapMode::Off);
    let outcome = crawl.coordinator.start_crawl("site-1", &base, 5).await;

    // title_too_short (low) + missing_h1 (high)
    assert_eq!(outcome.health_score(), Some(88));

    let report_path = crawl.dir.path().join("report.md");
    let mut storage = crawl.storage.lock().unwrap();
    write_markdown_report(&*storage, "site-1", &report_path).unwrap();

    let report = std::fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("- **Health Score**: 88/100"));
    assert!(report.contains(&format!("### {}/\n", base)));
    assert!(report.contains("`missing_h1`"));
    assert!(report.contains("`title_too_short`"));

    for issue in storage.list_issues("site-1", true).unwrap() {
        storage.resolve_issue(issue.id).unwrap();
    }
    assert_eq!(rescore_site(&mut *storage, "site-1").unwrap(), 100);
    assert_eq!(
        storage.get_site("site-1").unwrap().unwrap().health_score,
        Some(100)
    );
}
