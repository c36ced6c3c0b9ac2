//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the other parts together:
//! - Registering the site and recording a crawl run
//! - Seeding the frontier from the site root and the sitemap
//! - Rendering, extracting and auditing one page at a time
//! - Recording page failures as `crawl_error` issues
//! - Scoring the site once the frontier or the budget is exhausted

use crate::audit::{detect_issues, health_score, Finding, Issue};
use crate::config::{Config, SitemapMode};
use crate::crawler::sitemap::{parse_sitemap, Sitemap, SitemapKind};
use crate::crawler::{CrawlOutcome, Frontier};
use crate::render::{
    EngineLauncher, EngineSession, NavigationOptions, PageSnapshot, RenderPage, RenderResult,
};
use crate::storage::{IssueStore, RunStatus, SiteUpdate, StorageError};
use crate::url::{extract_domain, normalize_url, site_root, sitemap_url};
use crate::{AuditError, Result};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::collections::{HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use url::Url;

/// Counters carried through one crawl
#[derive(Debug, Default, Clone, Copy)]
struct CrawlProgress {
    pages_visited: u32,
    issues_recorded: u32,
}

/// Main crawler coordinator structure
///
/// A coordinator can run any number of crawls. Each call to
/// [`Coordinator::start_crawl`] builds its own frontier and engine session, so
/// nothing is shared between invocations except the issue store.
pub struct Coordinator<S: IssueStore> {
    config: Arc<Config>,
    storage: Arc<Mutex<S>>,
    launcher: Arc<dyn EngineLauncher>,
    navigation: NavigationOptions,
    config_hash: String,
}

impl<S: IssueStore> Coordinator<S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `storage` - The issue store shared with the caller
    /// * `launcher` - Starts one render engine per crawl
    pub fn new(config: Config, storage: Arc<Mutex<S>>, launcher: Arc<dyn EngineLauncher>) -> Self {
        let navigation = NavigationOptions::from_config(&config.crawler);

        Self {
            config: Arc::new(config),
            storage,
            launcher,
            navigation,
            config_hash: String::new(),
        }
    }

    /// Sets the configuration hash recorded on each crawl run
    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &Arc<Mutex<S>> {
        &self.storage
    }

    /// Crawls a site with the configured default budget
    pub async fn start_default_crawl(&self, site_id: &str, domain: &str) -> CrawlOutcome {
        self.start_crawl(site_id, domain, self.config.crawler.max_pages)
            .await
    }

    /// Crawls a site, records its issues and updates its health score
    ///
    /// Individual page failures are recorded as `crawl_error` issues and never
    /// abort the crawl. Only a fault outside a single page (engine launch,
    /// storage, an unexpected panic) yields [`CrawlOutcome::Failed`], in which
    /// case the health score is left untouched. The render engine is released
    /// on every path.
    ///
    /// # Arguments
    ///
    /// * `site_id` - Identifier the issues and score are stored under
    /// * `domain` - Host (`example.com`) or origin (`http://host:port`) to crawl
    /// * `budget` - Maximum number of pages to visit; 0 visits nothing but still rescores
    pub async fn start_crawl(&self, site_id: &str, domain: &str, budget: u32) -> CrawlOutcome {
        let start_time = Instant::now();
        tracing::info!(
            "Starting crawl of {} for site {} (budget {})",
            domain,
            site_id,
            budget
        );

        let (root, run_id) = match self.prepare(site_id, domain, budget) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::error!("Crawl of {} could not start: {}", domain, e);
                return CrawlOutcome::failed(e);
            }
        };

        let mut session = EngineSession::new(Arc::clone(&self.launcher));
        let mut progress = CrawlProgress::default();

        let result = AssertUnwindSafe(self.crawl_and_score(
            site_id,
            &root,
            budget,
            &mut session,
            &mut progress,
        ))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(AuditError::Fault(panic_message(panic.as_ref()))));

        session.release().await;

        match result {
            Ok(score) => {
                self.close_run(run_id, RunStatus::Completed, progress.pages_visited, Some(score));
                tracing::info!(
                    "Crawl of {} completed: {} pages, {} issues, health score {} in {:?}",
                    domain,
                    progress.pages_visited,
                    progress.issues_recorded,
                    score,
                    start_time.elapsed()
                );
                CrawlOutcome::Completed {
                    health_score: score,
                    pages_visited: progress.pages_visited,
                    issues_recorded: progress.issues_recorded,
                }
            }
            Err(e) => {
                self.close_run(run_id, RunStatus::Failed, progress.pages_visited, None);
                tracing::error!("Crawl of {} failed: {}", domain, e);
                CrawlOutcome::failed(e)
            }
        }
    }

    /// Validates the inputs, registers the site and opens a crawl run
    fn prepare(&self, site_id: &str, domain: &str, budget: u32) -> Result<(Url, i64)> {
        let root = site_root(domain).map_err(|_| AuditError::InvalidDomain(domain.to_string()))?;

        let mut store = self.store()?;
        store.ensure_site(site_id, domain)?;
        let run_id = store.begin_run(site_id, &self.config_hash)?;

        Ok((root, run_id))
    }

    async fn crawl_and_score(
        &self,
        site_id: &str,
        root: &Url,
        budget: u32,
        session: &mut EngineSession,
        progress: &mut CrawlProgress,
    ) -> Result<u8> {
        let site_domain =
            extract_domain(root).ok_or_else(|| AuditError::InvalidDomain(root.to_string()))?;
        let mut frontier = Frontier::new(&site_domain, budget as usize);
        self.seed_frontier(&mut frontier, root, session).await?;

        self.run_loop(site_id, &mut frontier, session, progress)
            .await?;

        let mut store = self.store()?;
        store.update_site(
            site_id,
            SiteUpdate {
                last_crawled_at: Some(Utc::now()),
                health_score: None,
            },
        )?;
        rescore_site(&mut *store, site_id)
    }

    async fn seed_frontier(
        &self,
        frontier: &mut Frontier,
        root: &Url,
        session: &mut EngineSession,
    ) -> Result<()> {
        frontier.seed([root.clone()]);
        if !frontier.has_budget() {
            return Ok(());
        }

        match self.config.crawler.sitemap {
            SitemapMode::Off => {}
            SitemapMode::Page => {
                frontier.seed([sitemap_url(root)?]);
            }
            SitemapMode::Discover => {
                self.discover_from_sitemap(frontier, sitemap_url(root)?, session)
                    .await?;
            }
        }

        tracing::debug!("Frontier seeded with {} URLs", frontier.queued_count());
        Ok(())
    }

    /// Reads the sitemap (and the sitemaps an index points to) into the frontier
    ///
    /// Sitemap documents are neither audited nor counted against the budget.
    /// Every failure except a fatal engine error is logged and ignored.
    async fn discover_from_sitemap(
        &self,
        frontier: &mut Frontier,
        sitemap: Url,
        session: &mut EngineSession,
    ) -> Result<()> {
        let max_children = self.config.crawler.max_sitemap_files as usize;
        let mut pending = VecDeque::from([sitemap]);
        let mut seen = HashSet::new();

        while let Some(url) = pending.pop_front() {
            if !seen.insert(url.to_string()) {
                continue;
            }

            let xml = match self.fetch_document(session, &url).await {
                Ok(xml) => xml,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    tracing::warn!("Skipping sitemap {}: {}", url, e);
                    continue;
                }
            };

            match parse_sitemap(&xml) {
                Ok(Sitemap {
                    kind: SitemapKind::Urlset,
                    locations,
                }) => {
                    let added = frontier.discover(&locations);
                    tracing::debug!(
                        "Sitemap {} listed {} URLs, {} new",
                        url,
                        locations.len(),
                        added
                    );
                }
                Ok(Sitemap {
                    kind: SitemapKind::Index,
                    locations,
                }) => {
                    for location in locations {
                        if seen.len() + pending.len() > max_children {
                            tracing::warn!(
                                "Sitemap index {} lists more than {} sitemaps, ignoring the rest",
                                url,
                                max_children
                            );
                            break;
                        }
                        match normalize_url(&location) {
                            Ok(child) if frontier.in_scope(&child) => pending.push_back(child),
                            _ => tracing::debug!("Ignoring sitemap entry {}", location),
                        }
                    }
                }
                Err(e) => tracing::warn!("Skipping sitemap {}: {}", url, e),
            }
        }

        Ok(())
    }

    async fn run_loop(
        &self,
        site_id: &str,
        frontier: &mut Frontier,
        session: &mut EngineSession,
        progress: &mut CrawlProgress,
    ) -> Result<()> {
        let start_time = Instant::now();

        while let Some(url) = frontier.claim_next() {
            tracing::debug!("Processing URL: {}", url);

            let findings = match self.audit_page(session, &url).await {
                Ok(snapshot) => {
                    if self.config.crawler.follow_links {
                        let added = frontier.discover(&snapshot.links);
                        tracing::trace!("{} new links from {}", added, url);
                    }
                    detect_issues(&snapshot)
                }
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    tracing::warn!("Failed to crawl {}: {}", url, e);
                    vec![Finding::crawl_error(&e)]
                }
            };

            progress.issues_recorded += self.record_findings(site_id, &url, findings)?;
            progress.pages_visited += 1;

            // Progress reporting every 10 pages
            if progress.pages_visited % 10 == 0 {
                let elapsed = start_time.elapsed();
                tracing::info!(
                    "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                    progress.pages_visited,
                    frontier.queued_count(),
                    progress.pages_visited as f64 / elapsed.as_secs_f64()
                );
            }
        }

        if frontier.has_budget() {
            tracing::info!("Frontier is empty, crawl complete");
        } else {
            tracing::info!(
                "Page budget of {} reached with {} URLs left in frontier",
                frontier.budget(),
                frontier.queued_count()
            );
        }

        Ok(())
    }

    /// Renders one page in a fresh browsing context and extracts its snapshot
    async fn audit_page(
        &self,
        session: &mut EngineSession,
        url: &Url,
    ) -> RenderResult<PageSnapshot> {
        let mut page = session.open_page().await?;

        let result = match page.navigate(url, &self.navigation).await {
            Ok(_) => page.extract().await,
            Err(e) => Err(e),
        };

        close_page(page.as_mut(), url).await;
        result
    }

    /// Loads a raw document through the engine
    async fn fetch_document(&self, session: &mut EngineSession, url: &Url) -> RenderResult<String> {
        let mut page = session.open_page().await?;

        let result = match page.navigate(url, &self.navigation).await {
            Ok(_) => page.content().await,
            Err(e) => Err(e),
        };

        close_page(page.as_mut(), url).await;
        result
    }

    fn record_findings(&self, site_id: &str, url: &Url, findings: Vec<Finding>) -> Result<u32> {
        let mut store = self.store()?;
        let mut recorded = 0;

        for finding in findings {
            let issue = Issue::from_finding(site_id, url.as_str(), finding);
            store.insert_issue(&issue)?;
            recorded += 1;
        }

        Ok(recorded)
    }

    fn close_run(&self, run_id: i64, status: RunStatus, pages_visited: u32, score: Option<u8>) {
        let result = self
            .store()
            .and_then(|mut store| Ok(store.finish_run(run_id, status, pages_visited, score)?));

        if let Err(e) = result {
            tracing::warn!("Failed to close crawl run {}: {}", run_id, e);
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, S>> {
        self.storage.lock().map_err(|_| {
            AuditError::Storage(StorageError::Database(
                "storage lock poisoned".to_string(),
            ))
        })
    }
}

/// Recomputes a site's health score from its unresolved issues and stores it
///
/// # Returns
///
/// The new health score
pub fn rescore_site<S: IssueStore + ?Sized>(store: &mut S, site_id: &str) -> Result<u8> {
    let severities = store.query_unresolved_severities(site_id)?;
    let unresolved = severities.len();
    let score = health_score(severities);

    store.update_site(
        site_id,
        SiteUpdate {
            last_crawled_at: None,
            health_score: Some(score),
        },
    )?;

    tracing::info!(
        "Health score for site {}: {} ({} unresolved issues)",
        site_id,
        score,
        unresolved
    );
    Ok(score)
}

async fn close_page(page: &mut dyn RenderPage, url: &Url) {
    if let Err(e) = page.close().await {
        tracing::warn!("Failed to close page {}: {}", url, e);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic during crawl".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{IssueType, Severity};
    use crate::config::{CrawlerConfig, OutputConfig, UserAgentConfig};
    use crate::render::{NavigationResult, RenderEngine, RenderError};
    use crate::storage::SqliteStorage;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    enum Scripted {
        Page(PageSnapshot),
        Document(String),
        Fail(&'static str),
        Panic,
    }

    #[derive(Default)]
    struct Script {
        responses: HashMap<String, Scripted>,
        navigations: Mutex<Vec<String>>,
        shutdowns: AtomicUsize,
        fail_launch: bool,
    }

    impl Script {
        fn navigated(&self) -> Vec<String> {
            self.navigations.lock().unwrap().clone()
        }
    }

    struct FakeLauncher(Arc<Script>);
    struct FakeEngine(Arc<Script>);
    struct FakePage {
        script: Arc<Script>,
        current: Option<(Url, Scripted)>,
    }

    #[async_trait]
    impl EngineLauncher for FakeLauncher {
        async fn launch(&self) -> RenderResult<Box<dyn RenderEngine>> {
            if self.0.fail_launch {
                return Err(RenderError::EngineUnavailable("browser missing".to_string()));
            }
            Ok(Box::new(FakeEngine(Arc::clone(&self.0))))
        }
    }

    #[async_trait]
    impl RenderEngine for FakeEngine {
        async fn open_page(&mut self) -> RenderResult<Box<dyn RenderPage>> {
            Ok(Box::new(FakePage {
                script: Arc::clone(&self.0),
                current: None,
            }))
        }

        async fn shutdown(&mut self) -> RenderResult<()> {
            self.0.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl RenderPage for FakePage {
        async fn navigate(
            &mut self,
            url: &Url,
            _options: &NavigationOptions,
        ) -> RenderResult<NavigationResult> {
            self.script.navigations.lock().unwrap().push(url.to_string());

            let response = self
                .script
                .responses
                .get(url.as_str())
                .cloned()
                .unwrap_or(Scripted::Fail("HTTP 404"));

            match &response {
                Scripted::Fail(message) => {
                    return Err(RenderError::Navigation {
                        url: url.to_string(),
                        message: message.to_string(),
                    })
                }
                Scripted::Panic => panic!("renderer crashed on {}", url),
                _ => {}
            }

            self.current = Some((url.clone(), response));
            Ok(NavigationResult {
                status_code: 200,
                elapsed_ms: 100,
                final_url: url.clone(),
            })
        }

        async fn extract(&mut self) -> RenderResult<PageSnapshot> {
            match &self.current {
                Some((url, Scripted::Page(snapshot))) => Ok(PageSnapshot {
                    url: url.to_string(),
                    ..snapshot.clone()
                }),
                Some((url, _)) => Ok(PageSnapshot::new(url.as_str())),
                None => Err(RenderError::Extraction {
                    url: String::new(),
                    message: "nothing loaded".to_string(),
                }),
            }
        }

        async fn content(&mut self) -> RenderResult<String> {
            match &self.current {
                Some((_, Scripted::Document(body))) => Ok(body.clone()),
                _ => Ok("<html></html>".to_string()),
            }
        }

        async fn close(&mut self) -> RenderResult<()> {
            self.current = None;
            Ok(())
        }
    }

    fn create_test_config(sitemap: SitemapMode) -> Config {
        Config {
            crawler: CrawlerConfig {
                sitemap,
                ..CrawlerConfig::default()
            },
            user_agent: UserAgentConfig {
                crawler_name: "TestCrawler".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            output: OutputConfig {
                database_path: ":memory:".to_string(),
                report_path: None,
            },
        }
    }

    /// A page that triggers no rule
    fn healthy_page(links: &[&str]) -> PageSnapshot {
        PageSnapshot {
            title: Some("Example Store - Quality Goods Since 1999".to_string()),
            meta_description: Some("Quality goods delivered to your door.".to_string()),
            h1: vec!["Welcome".to_string()],
            content_length: 1200,
            load_time_ms: 400,
            status_code: 200,
            links: links.iter().map(|l| l.to_string()).collect(),
            ..PageSnapshot::default()
        }
    }

    fn build_coordinator(
        script: Script,
        sitemap: SitemapMode,
    ) -> (Coordinator<SqliteStorage>, Arc<Script>) {
        let script = Arc::new(script);
        let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
        let launcher = Arc::new(FakeLauncher(Arc::clone(&script)));
        let coordinator = Coordinator::new(create_test_config(sitemap), storage, launcher)
            .with_config_hash("test-hash");
        (coordinator, script)
    }

    fn scripted(responses: Vec<(&str, Scripted)>) -> Script {
        Script {
            responses: responses
                .into_iter()
                .map(|(url, response)| (url.to_string(), response))
                .collect(),
            ..Script::default()
        }
    }

    fn issue_types(
        coordinator: &Coordinator<SqliteStorage>,
        site_id: &str,
    ) -> Vec<(String, IssueType, Severity)> {
        coordinator
            .storage()
            .lock()
            .unwrap()
            .list_issues(site_id, false)
            .unwrap()
            .into_iter()
            .map(|issue| (issue.page_url, issue.issue_type, issue.severity))
            .collect()
    }

    #[tokio::test]
    async fn test_missing_h1_and_slow_page_scores_80() {
        let page = PageSnapshot {
            h1: vec![],
            load_time_ms: 4000,
            ..healthy_page(&[])
        };
        let (coordinator, script) = build_coordinator(
            scripted(vec![("https://example.com/", Scripted::Page(page))]),
            SitemapMode::Off,
        );

        let outcome = coordinator.start_crawl("site-1", "example.com", 50).await;

        assert_eq!(
            outcome,
            CrawlOutcome::Completed {
                health_score: 80,
                pages_visited: 1,
                issues_recorded: 2,
            }
        );
        assert_eq!(
            issue_types(&coordinator, "site-1"),
            vec![
                ("https://example.com/".to_string(), IssueType::MissingH1, Severity::High),
                ("https://example.com/".to_string(), IssueType::SlowLoading, Severity::High),
            ]
        );

        let site = coordinator
            .storage()
            .lock()
            .unwrap()
            .get_site("site-1")
            .unwrap()
            .unwrap();
        assert_eq!(site.health_score, Some(80));
        assert!(site.last_crawled_at.is_some());
        assert_eq!(script.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_page_recorded_and_crawl_continues() {
        let (coordinator, script) = build_coordinator(
            scripted(vec![
                (
                    "https://example.com/",
                    Scripted::Page(healthy_page(&[
                        "https://example.com/broken",
                        "https://example.com/pricing",
                    ])),
                ),
                ("https://example.com/broken", Scripted::Fail("HTTP 500")),
                ("https://example.com/pricing", Scripted::Page(healthy_page(&[]))),
            ]),
            SitemapMode::Off,
        );

        let outcome = coordinator.start_crawl("site-1", "example.com", 50).await;

        assert_eq!(outcome.health_score(), Some(90));
        assert_eq!(script.navigated().len(), 3);

        let issues = coordinator
            .storage()
            .lock()
            .unwrap()
            .list_issues("site-1", false)
            .unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::CrawlError);
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[0].page_url, "https://example.com/broken");
        assert!(issues[0].description.starts_with("Failed to crawl page:"));
        assert!(issues[0].description.contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_budget_bounds_pages_visited() {
        let links = [
            "https://example.com/1",
            "https://example.com/2",
            "https://example.com/3",
            "https://example.com/4",
            "https://example.com/5",
        ];
        let mut responses = vec![("https://example.com/", Scripted::Page(healthy_page(&links)))];
        for link in links {
            responses.push((link, Scripted::Page(healthy_page(&links))));
        }
        let (coordinator, script) = build_coordinator(scripted(responses), SitemapMode::Off);

        let outcome = coordinator.start_crawl("site-1", "example.com", 2).await;

        assert!(matches!(outcome, CrawlOutcome::Completed { pages_visited: 2, .. }));
        assert_eq!(
            script.navigated(),
            vec![
                "https://example.com/".to_string(),
                "https://example.com/1".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_links_outside_site_not_followed() {
        let (coordinator, script) = build_coordinator(
            scripted(vec![(
                "https://example.com/",
                Scripted::Page(healthy_page(&[
                    "https://other.com/",
                    "https://example.com/#top",
                    "https://www.example.com/about",
                ])),
            )]),
            SitemapMode::Off,
        );

        coordinator.start_crawl("site-1", "example.com", 50).await;

        assert_eq!(
            script.navigated(),
            vec![
                "https://example.com/".to_string(),
                "https://www.example.com/about".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_engine_unavailable_fails_without_scoring() {
        let (coordinator, _) = build_coordinator(
            Script {
                fail_launch: true,
                ..Script::default()
            },
            SitemapMode::Off,
        );

        let outcome = coordinator.start_crawl("site-1", "example.com", 50).await;

        match outcome {
            CrawlOutcome::Failed { error } => assert!(error.contains("browser missing")),
            other => panic!("expected failure, got {:?}", other),
        }

        let store = coordinator.storage().lock().unwrap();
        let site = store.get_site("site-1").unwrap().unwrap();
        assert_eq!(site.health_score, None);
        assert_eq!(site.last_crawled_at, None);
        assert_eq!(store.list_runs("site-1").unwrap()[0].status, RunStatus::Failed);
    }

    #[tokio::test]
    async fn test_panic_is_contained_and_engine_released() {
        let (coordinator, script) = build_coordinator(
            scripted(vec![("https://example.com/", Scripted::Panic)]),
            SitemapMode::Off,
        );

        let outcome = coordinator.start_crawl("site-1", "example.com", 50).await;

        match outcome {
            CrawlOutcome::Failed { error } => assert!(error.contains("renderer crashed")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(script.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_domain_fails_before_crawling() {
        let (coordinator, script) = build_coordinator(Script::default(), SitemapMode::Off);

        let outcome = coordinator.start_crawl("site-1", "   ", 10).await;
        assert!(!outcome.is_success());
        assert!(script.navigated().is_empty());
    }

    #[tokio::test]
    async fn test_zero_budget_visits_nothing_and_still_scores() {
        let (coordinator, script) = build_coordinator(
            scripted(vec![("https://example.com/", Scripted::Page(healthy_page(&[])))]),
            SitemapMode::Discover,
        );
        {
            let storage = coordinator.storage();
            let mut store = storage.lock().unwrap();
            store.ensure_site("site-1", "example.com").unwrap();
            store
                .insert_issue(&Issue::from_finding(
                    "site-1",
                    "https://example.com/old",
                    Finding::new(
                        IssueType::MissingH1,
                        Severity::High,
                        "Page is missing an H1 tag",
                        "Add an H1",
                    ),
                ))
                .unwrap();
        }

        let outcome = coordinator.start_crawl("site-1", "example.com", 0).await;

        assert_eq!(
            outcome,
            CrawlOutcome::Completed {
                health_score: 90,
                pages_visited: 0,
                issues_recorded: 0,
            }
        );
        assert!(script.navigated().is_empty());

        let site = coordinator
            .storage()
            .lock()
            .unwrap()
            .get_site("site-1")
            .unwrap()
            .unwrap();
        assert!(site.last_crawled_at.is_some());
        assert_eq!(site.health_score, Some(90));
    }

    #[tokio::test]
    async fn test_budget_above_config_limit_is_accepted() {
        let (coordinator, _script) = build_coordinator(
            scripted(vec![("https://example.com/", Scripted::Page(healthy_page(&[])))]),
            SitemapMode::Off,
        );

        let outcome = coordinator.start_crawl("site-1", "example.com", 20_000).await;
        assert_eq!(outcome.health_score(), Some(100));
    }

    #[tokio::test]
    async fn test_sitemap_discovery_is_not_audited() {
        let sitemap = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/a</loc></url>
  <url><loc>https://example.com/b</loc></url>
  <url><loc>https://elsewhere.com/c</loc></url>
</urlset>"#;
        let (coordinator, script) = build_coordinator(
            scripted(vec![
                ("https://example.com/", Scripted::Page(healthy_page(&[]))),
                ("https://example.com/sitemap.xml", Scripted::Document(sitemap.to_string())),
                ("https://example.com/a", Scripted::Page(healthy_page(&[]))),
                ("https://example.com/b", Scripted::Page(healthy_page(&[]))),
            ]),
            SitemapMode::Discover,
        );

        let outcome = coordinator.start_crawl("site-1", "example.com", 50).await;

        assert_eq!(
            outcome,
            CrawlOutcome::Completed {
                health_score: 100,
                pages_visited: 3,
                issues_recorded: 0,
            }
        );
        assert_eq!(
            script.navigated(),
            vec![
                "https://example.com/sitemap.xml".to_string(),
                "https://example.com/".to_string(),
                "https://example.com/a".to_string(),
                "https://example.com/b".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_sitemap_index_fans_out() {
        let index = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/sitemap-pages.xml</loc></sitemap>
</sitemapindex>"#;
        let pages = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/team</loc></url>
</urlset>"#;
        let (coordinator, script) = build_coordinator(
            scripted(vec![
                ("https://example.com/", Scripted::Page(healthy_page(&[]))),
                ("https://example.com/sitemap.xml", Scripted::Document(index.to_string())),
                ("https://example.com/sitemap-pages.xml", Scripted::Document(pages.to_string())),
                ("https://example.com/team", Scripted::Page(healthy_page(&[]))),
            ]),
            SitemapMode::Discover,
        );

        let outcome = coordinator.start_crawl("site-1", "example.com", 50).await;

        assert!(matches!(outcome, CrawlOutcome::Completed { pages_visited: 2, .. }));
        assert!(script
            .navigated()
            .contains(&"https://example.com/team".to_string()));
    }

    #[tokio::test]
    async fn test_missing_sitemap_is_ignored() {
        let (coordinator, _) = build_coordinator(
            scripted(vec![("https://example.com/", Scripted::Page(healthy_page(&[])))]),
            SitemapMode::Discover,
        );

        let outcome = coordinator.start_crawl("site-1", "example.com", 50).await;

        assert_eq!(
            outcome,
            CrawlOutcome::Completed {
                health_score: 100,
                pages_visited: 1,
                issues_recorded: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_sitemap_page_mode_audits_sitemap() {
        let (coordinator, _) = build_coordinator(
            scripted(vec![
                ("https://example.com/", Scripted::Page(healthy_page(&[]))),
                (
                    "https://example.com/sitemap.xml",
                    Scripted::Document("<urlset/>".to_string()),
                ),
            ]),
            SitemapMode::Page,
        );

        let outcome = coordinator.start_crawl("site-1", "example.com", 50).await;

        assert!(matches!(outcome, CrawlOutcome::Completed { pages_visited: 2, .. }));
        let issues = issue_types(&coordinator, "site-1");
        assert!(issues.contains(&(
            "https://example.com/sitemap.xml".to_string(),
            IssueType::MissingTitle,
            Severity::Critical
        )));
    }

    #[tokio::test]
    async fn test_repeated_crawls_accumulate_issues() {
        let page = PageSnapshot {
            h1: vec![],
            ..healthy_page(&[])
        };
        let (coordinator, _) = build_coordinator(
            scripted(vec![("https://example.com/", Scripted::Page(page))]),
            SitemapMode::Off,
        );

        assert_eq!(
            coordinator.start_crawl("site-1", "example.com", 50).await.health_score(),
            Some(90)
        );
        assert_eq!(
            coordinator.start_crawl("site-1", "example.com", 50).await.health_score(),
            Some(80)
        );
        assert_eq!(
            coordinator.storage().lock().unwrap().list_runs("site-1").unwrap().len(),
            2
        );
    }

    #[test]
    fn test_rescore_site_ignores_resolved() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.ensure_site("site-1", "example.com").unwrap();
        let finding = Finding::crawl_error("timeout");
        let id = storage
            .insert_issue(&Issue::from_finding("site-1", "https://example.com/", finding.clone()))
            .unwrap();
        storage
            .insert_issue(&Issue::from_finding("site-1", "https://example.com/x", finding))
            .unwrap();

        assert_eq!(rescore_site(&mut storage, "site-1").unwrap(), 80);
        storage.resolve_issue(id).unwrap();
        assert_eq!(rescore_site(&mut storage, "site-1").unwrap(), 90);
        assert_eq!(
            storage.get_site("site-1").unwrap().unwrap().health_score,
            Some(90)
        );
    }
}
