//! Issue vocabulary: severities, issue types, and issue records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal weight of a detected defect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities, most severe first
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Points subtracted from the health score for one unresolved issue
    pub fn penalty(&self) -> u32 {
        match self {
            Self::Critical => 20,
            Self::High => 10,
            Self::Medium => 5,
            Self::Low => 2,
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Fixed vocabulary of issue types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    MissingTitle,
    TitleTooLong,
    TitleTooShort,
    MissingMetaDescription,
    MetaDescriptionTooLong,
    MissingH1,
    MultipleH1,
    ImagesMissingAlt,
    ThinContent,
    SlowLoading,
    /// The page could not be fetched or rendered at all
    CrawlError,
}

impl IssueType {
    pub const ALL: [IssueType; 11] = [
        IssueType::MissingTitle,
        IssueType::TitleTooLong,
        IssueType::TitleTooShort,
        IssueType::MissingMetaDescription,
        IssueType::MetaDescriptionTooLong,
        IssueType::MissingH1,
        IssueType::MultipleH1,
        IssueType::ImagesMissingAlt,
        IssueType::ThinContent,
        IssueType::SlowLoading,
        IssueType::CrawlError,
    ];

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::MissingTitle => "missing_title",
            Self::TitleTooLong => "title_too_long",
            Self::TitleTooShort => "title_too_short",
            Self::MissingMetaDescription => "missing_meta_description",
            Self::MetaDescriptionTooLong => "meta_description_too_long",
            Self::MissingH1 => "missing_h1",
            Self::MultipleH1 => "multiple_h1",
            Self::ImagesMissingAlt => "images_missing_alt",
            Self::ThinContent => "thin_content",
            Self::SlowLoading => "slow_loading",
            Self::CrawlError => "crawl_error",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.to_db_string() == s)
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// A defect found on one page, before it is attributed to a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub issue_type: IssueType,
    pub severity: Severity,
    pub description: String,
    pub suggested_fix: Option<String>,
}

impl Finding {
    pub fn new(
        issue_type: IssueType,
        severity: Severity,
        description: impl Into<String>,
        suggested_fix: impl Into<String>,
    ) -> Self {
        Self {
            issue_type,
            severity,
            description: description.into(),
            suggested_fix: Some(suggested_fix.into()),
        }
    }

    /// The finding recorded for a page whose fetch or render failed
    pub fn crawl_error(error: impl fmt::Display) -> Self {
        Self::new(
            IssueType::CrawlError,
            Severity::High,
            format!("Failed to crawl page: {}", error),
            "Check if the page is accessible and fix any server errors",
        )
    }
}

/// A detected defect as stored for a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub site_id: String,
    pub page_url: String,
    pub issue_type: IssueType,
    pub severity: Severity,
    pub description: String,
    pub suggested_fix: Option<String>,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

impl Issue {
    /// Attributes a finding to a page of a site; new issues start unresolved
    pub fn from_finding(site_id: &str, page_url: &str, finding: Finding) -> Self {
        Self {
            site_id: site_id.to_string(),
            page_url: page_url.to_string(),
            issue_type: finding.issue_type,
            severity: finding.severity,
            description: finding.description,
            suggested_fix: finding.suggested_fix,
            resolved: false,
            created_at: Utc::now(),
        }
    }
}
