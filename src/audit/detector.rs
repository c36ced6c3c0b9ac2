//! Rule-based on-page issue detection
//!
//! Rules are evaluated in a fixed order and the resulting findings keep that
//! order, so the same snapshot always yields the same list.
//!
//! | Condition | Issue type | Severity |
//! |-----------|------------|----------|
//! | title absent or blank | `missing_title` | critical |
//! | title longer than 60 characters | `title_too_long` | medium |
//! | title shorter than 30 characters | `title_too_short` | low |
//! | meta description absent or blank | `missing_meta_description` | high |
//! | meta description longer than 160 characters | `meta_description_too_long` | medium |
//! | no H1 | `missing_h1` | high |
//! | more than one H1 | `multiple_h1` | medium |
//! | images without alt text | `images_missing_alt` | medium |
//! | under 300 characters of content | `thin_content` | medium |
//! | load time over 3000ms | `slow_loading` | high |

use crate::audit::issue::{Finding, IssueType, Severity};
use crate::render::PageSnapshot;

pub const TITLE_MAX_CHARS: usize = 60;
pub const TITLE_MIN_CHARS: usize = 30;
pub const META_DESCRIPTION_MAX_CHARS: usize = 160;
pub const THIN_CONTENT_CHARS: usize = 300;
pub const SLOW_LOAD_MS: u64 = 3000;

/// Evaluates the rule table against one page snapshot
///
/// Lengths are measured in Unicode scalar values. Every description embeds
/// the value that triggered the rule.
///
/// # Example
///
/// ```
/// use site_audit::audit::{detect_issues, IssueType};
/// use site_audit::render::PageSnapshot;
///
/// let snapshot = PageSnapshot::new("https://example.com/");
/// let findings = detect_issues(&snapshot);
/// assert_eq!(findings[0].issue_type, IssueType::MissingTitle);
/// ```
pub fn detect_issues(snapshot: &PageSnapshot) -> Vec<Finding> {
    let mut findings = Vec::new();

    check_title(snapshot.title.as_deref(), &mut findings);
    check_meta_description(snapshot.meta_description.as_deref(), &mut findings);
    check_headings(&snapshot.h1, &mut findings);

    if snapshot.images_without_alt > 0 {
        findings.push(Finding::new(
            IssueType::ImagesMissingAlt,
            Severity::Medium,
            format!(
                "{} images are missing alt text",
                snapshot.images_without_alt
            ),
            "Add descriptive alt text to all images for accessibility and SEO",
        ));
    }

    if snapshot.content_length < THIN_CONTENT_CHARS {
        findings.push(Finding::new(
            IssueType::ThinContent,
            Severity::Medium,
            format!(
                "Page has thin content ({} characters)",
                snapshot.content_length
            ),
            "Add more valuable, relevant content (aim for 300+ words)",
        ));
    }

    if snapshot.load_time_ms > SLOW_LOAD_MS {
        findings.push(Finding::new(
            IssueType::SlowLoading,
            Severity::High,
            format!(
                "Page loads slowly ({}s)",
                rounded_seconds(snapshot.load_time_ms)
            ),
            "Optimize images, minify CSS/JS, and consider using a CDN",
        ));
    }

    findings
}

fn check_title(title: Option<&str>, findings: &mut Vec<Finding>) {
    let Some(title) = title.filter(|t| !t.trim().is_empty()) else {
        findings.push(Finding::new(
            IssueType::MissingTitle,
            Severity::Critical,
            "Page is missing a title tag",
            "Add a descriptive title tag (50-60 characters)",
        ));
        return;
    };

    let length = title.chars().count();
    if length > TITLE_MAX_CHARS {
        findings.push(Finding::new(
            IssueType::TitleTooLong,
            Severity::Medium,
            format!("Title is too long ({} characters)", length),
            "Shorten title to 50-60 characters",
        ));
    } else if length < TITLE_MIN_CHARS {
        findings.push(Finding::new(
            IssueType::TitleTooShort,
            Severity::Low,
            format!("Title is too short ({} characters)", length),
            "Expand title to 30-60 characters",
        ));
    }
}

fn check_meta_description(description: Option<&str>, findings: &mut Vec<Finding>) {
    let Some(description) = description.filter(|d| !d.trim().is_empty()) else {
        findings.push(Finding::new(
            IssueType::MissingMetaDescription,
            Severity::High,
            "Page is missing a meta description",
            "Add a compelling meta description (150-160 characters)",
        ));
        return;
    };

    let length = description.chars().count();
    if length > META_DESCRIPTION_MAX_CHARS {
        findings.push(Finding::new(
            IssueType::MetaDescriptionTooLong,
            Severity::Medium,
            format!("Meta description is too long ({} characters)", length),
            "Shorten meta description to 150-160 characters",
        ));
    }
}

fn check_headings(h1: &[String], findings: &mut Vec<Finding>) {
    match h1.len() {
        0 => findings.push(Finding::new(
            IssueType::MissingH1,
            Severity::High,
            "Page is missing an H1 tag",
            "Add a descriptive H1 tag that includes your target keyword",
        )),
        1 => {}
        count => findings.push(Finding::new(
            IssueType::MultipleH1,
            Severity::Medium,
            format!("Page has multiple H1 tags ({})", count),
            "Use only one H1 tag per page",
        )),
    }
}

/// Milliseconds to whole seconds, halves rounded up
fn rounded_seconds(ms: u64) -> u64 {
    (ms + 500) / 1000
}
