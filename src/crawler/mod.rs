//! Crawler module for site crawling and auditing
//!
//! This module contains the core crawling logic, including:
//! - The per-crawl frontier with its page budget and same-site scoping
//! - Sitemap parsing for link discovery
//! - Overall crawl coordination and scoring

mod coordinator;
mod frontier;
mod sitemap;

pub use coordinator::{rescore_site, Coordinator};
pub use frontier::Frontier;
pub use sitemap::{parse_sitemap, Sitemap, SitemapError, SitemapKind};

use crate::AuditError;
use serde::{Deserialize, Serialize};

/// Result of one call to [`Coordinator::start_crawl`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CrawlOutcome {
    /// The crawl ran to the end and the site was scored
    Completed {
        health_score: u8,
        pages_visited: u32,
        issues_recorded: u32,
    },

    /// The crawl was aborted; the stored health score was not touched
    Failed { error: String },
}

impl CrawlOutcome {
    pub fn failed(error: AuditError) -> Self {
        Self::Failed {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Returns the health score of a completed crawl
    pub fn health_score(&self) -> Option<u8> {
        match self {
            Self::Completed { health_score, .. } => Some(*health_score),
            Self::Failed { .. } => None,
        }
    }
}
