//! Statistics generation from the audit database
//!
//! This module provides functionality for extracting and displaying
//! per-site issue statistics from the storage layer.

use crate::audit::{IssueType, Severity};
use crate::storage::{IssueRecord, IssueStore, RunRecord, SiteRecord, StorageError, StorageResult};
use std::collections::{BTreeMap, HashSet};

/// Issue statistics for one site
#[derive(Debug, Clone)]
pub struct SiteStatistics {
    pub site: SiteRecord,

    /// Every issue ever recorded, resolved or not
    pub total_issues: u64,

    pub unresolved_issues: u64,

    /// Unresolved issues per severity
    pub by_severity: BTreeMap<Severity, u64>,

    /// Unresolved issues per issue type
    pub by_type: BTreeMap<IssueType, u64>,

    /// Distinct pages with at least one unresolved issue
    pub pages_with_issues: u64,

    /// Most recent crawl run, if any
    pub last_run: Option<RunRecord>,
}

impl SiteStatistics {
    /// Builds statistics from a site and its full issue list
    pub fn from_issues(
        site: SiteRecord,
        issues: &[IssueRecord],
        last_run: Option<RunRecord>,
    ) -> Self {
        let mut by_severity = BTreeMap::new();
        let mut by_type = BTreeMap::new();
        let mut pages = HashSet::new();
        let mut unresolved_issues = 0;

        for issue in issues.iter().filter(|issue| !issue.resolved) {
            unresolved_issues += 1;
            *by_severity.entry(issue.severity).or_insert(0) += 1;
            *by_type.entry(issue.issue_type).or_insert(0) += 1;
            pages.insert(issue.page_url.as_str());
        }

        Self {
            site,
            total_issues: issues.len() as u64,
            unresolved_issues,
            by_severity,
            by_type,
            pages_with_issues: pages.len() as u64,
            last_run,
        }
    }

    pub fn severity_count(&self, severity: Severity) -> u64 {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

/// Loads statistics for a site from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `site_id` - The site to summarize
///
/// # Returns
///
/// * `Ok(SiteStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - The site is unknown or the query failed
pub fn load_site_statistics<S: IssueStore + ?Sized>(
    storage: &S,
    site_id: &str,
) -> StorageResult<SiteStatistics> {
    let site = storage
        .get_site(site_id)?
        .ok_or_else(|| StorageError::SiteNotFound(site_id.to_string()))?;
    let issues = storage.list_issues(site_id, false)?;
    let last_run = storage.list_runs(site_id)?.into_iter().next();

    Ok(SiteStatistics::from_issues(site, &issues, last_run))
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &SiteStatistics) {
    println!("=== Site Audit Statistics ===\n");

    println!("Site:");
    println!("  ID: {}", stats.site.id);
    println!("  Domain: {}", stats.site.domain);
    match stats.site.health_score {
        Some(score) => println!("  Health score: {}/100", score),
        None => println!("  Health score: not scored yet"),
    }
    match stats.site.last_crawled_at {
        Some(at) => println!("  Last crawled: {}", at.to_rfc3339()),
        None => println!("  Last crawled: never"),
    }
    println!();

    println!("Issues:");
    println!("  Total recorded: {}", stats.total_issues);
    println!("  Unresolved: {}", stats.unresolved_issues);
    println!("  Pages with issues: {}", stats.pages_with_issues);
    println!();

    if stats.unresolved_issues > 0 {
        println!("Unresolved by Severity:");
        for severity in Severity::ALL {
            let count = stats.severity_count(severity);
            if count > 0 {
                println!("  {}: {}", severity, count);
            }
        }
        println!();

        println!("Unresolved by Type:");
        // Sort types by count (descending)
        let mut type_counts: Vec<_> = stats.by_type.iter().collect();
        type_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (issue_type, count) in type_counts {
            println!("  {}: {}", issue_type, count);
        }
        println!();
    }

    if let Some(run) = &stats.last_run {
        println!(
            "Last Run: #{} {} ({} pages, started {})",
            run.id,
            run.status.to_db_string(),
            run.pages_visited,
            run.started_at.to_rfc3339()
        );
    }
}
