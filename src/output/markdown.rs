//! Markdown audit report generation
//!
//! This module generates a human-readable markdown report for one site,
//! including the health score, issue breakdowns, and per-page issue lists
//! with suggested fixes.

use crate::audit::Severity;
use crate::output::stats::{load_site_statistics, SiteStatistics};
use crate::output::OutputResult;
use crate::storage::{IssueRecord, IssueStore};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown audit report of a site
///
/// Only unresolved issues are listed per page.
///
/// # Arguments
///
/// * `storage` - The storage backend holding the site's issues
/// * `site_id` - The site to report on
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to load data or write the report
pub fn write_markdown_report<S: IssueStore + ?Sized>(
    storage: &S,
    site_id: &str,
    output_path: &Path,
) -> OutputResult<()> {
    let stats = load_site_statistics(storage, site_id)?;
    let issues = storage.list_issues(site_id, true)?;
    let markdown = format_markdown_report(&stats, &issues);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!("Audit report for {} written to {}", site_id, output_path.display());
    Ok(())
}

/// Formats a site audit as markdown
///
/// # Arguments
///
/// * `stats` - Statistics of the site
/// * `issues` - Issues to list per page, in the order they should appear
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_report(stats: &SiteStatistics, issues: &[IssueRecord]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# SEO Audit: {}\n\n", stats.site.domain));

    // Site metadata
    md.push_str("## Site Information\n\n");
    md.push_str(&format!("- **Site ID**: {}\n", stats.site.id));
    md.push_str(&format!("- **Domain**: {}\n", stats.site.domain));
    match stats.site.health_score {
        Some(score) => md.push_str(&format!("- **Health Score**: {}/100\n", score)),
        None => md.push_str("- **Health Score**: not scored yet\n"),
    }
    if let Some(crawled) = stats.site.last_crawled_at {
        md.push_str(&format!("- **Last Crawled**: {}\n", crawled.to_rfc3339()));
    }
    if let Some(run) = &stats.last_run {
        md.push_str(&format!(
            "- **Last Run**: #{} ({}, {} pages)\n",
            run.id,
            run.status.to_db_string(),
            run.pages_visited
        ));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Total Issues**: {}\n", stats.total_issues));
    md.push_str(&format!(
        "- **Unresolved Issues**: {}\n",
        stats.unresolved_issues
    ));
    md.push_str(&format!(
        "- **Pages With Issues**: {}\n\n",
        stats.pages_with_issues
    ));

    if stats.unresolved_issues == 0 {
        md.push_str("No unresolved issues.\n");
        return md;
    }

    // Severity breakdown
    md.push_str("## Issues by Severity\n\n");
    md.push_str("| Severity | Count | Penalty |\n");
    md.push_str("|----------|-------|---------|\n");
    for severity in Severity::ALL {
        let count = stats.severity_count(severity);
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            severity,
            count,
            count * u64::from(severity.penalty())
        ));
    }
    md.push('\n');

    // Issue type breakdown
    md.push_str("## Issues by Type\n\n");
    md.push_str("| Issue Type | Count |\n");
    md.push_str("|------------|-------|\n");
    let mut type_counts: Vec<_> = stats.by_type.iter().collect();
    type_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (issue_type, count) in type_counts {
        md.push_str(&format!("| {} | {} |\n", issue_type, count));
    }
    md.push('\n');

    // Per-page issues
    let mut pages: BTreeMap<&str, Vec<&IssueRecord>> = BTreeMap::new();
    for issue in issues.iter().filter(|issue| !issue.resolved) {
        pages.entry(issue.page_url.as_str()).or_default().push(issue);
    }

    if !pages.is_empty() {
        md.push_str("## Issues by Page\n\n");
        for (page_url, page_issues) in pages {
            md.push_str(&format!("### {}\n\n", page_url));
            for issue in page_issues {
                md.push_str(&format!(
                    "- **{}** `{}`: {}\n",
                    issue.severity, issue.issue_type, issue.description
                ));
                if let Some(fix) = &issue.suggested_fix {
                    md.push_str(&format!("  - Fix: {}\n", fix));
                }
            }
            md.push('\n');
        }
    }

    md
}
