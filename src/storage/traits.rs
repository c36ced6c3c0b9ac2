//! Storage traits and error types
//!
//! This module defines the trait interface for issue store backends and
//! associated error types.

use crate::audit::{Issue, Severity};
use crate::storage::{IssueRecord, RunRecord, RunStatus, SiteRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("Issue not found: {0}")]
    IssueNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Fields of a site row that a crawl may update
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiteUpdate {
    pub last_crawled_at: Option<DateTime<Utc>>,
    pub health_score: Option<u8>,
}

/// Trait for issue store implementations
///
/// The store is a durable, insert-only log of issues per site. Issues are
/// never deduplicated: crawling the same defect twice records it twice.
pub trait IssueStore {
    // ===== Sites =====

    /// Registers a site if it is not known yet
    ///
    /// # Arguments
    ///
    /// * `site_id` - Caller-chosen identifier of the site
    /// * `domain` - The domain the site is crawled from
    fn ensure_site(&mut self, site_id: &str, domain: &str) -> StorageResult<()>;

    /// Gets a site by ID
    fn get_site(&self, site_id: &str) -> StorageResult<Option<SiteRecord>>;

    /// Lists all known sites
    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>>;

    /// Applies a partial update to a site row
    ///
    /// Returns `SiteNotFound` if the site was never registered.
    fn update_site(&mut self, site_id: &str, update: SiteUpdate) -> StorageResult<()>;

    // ===== Issues =====

    /// Appends an issue to the log
    ///
    /// # Returns
    ///
    /// The ID of the newly stored issue
    fn insert_issue(&mut self, issue: &Issue) -> StorageResult<i64>;

    /// Returns the severity of every unresolved issue of a site
    fn query_unresolved_severities(&self, site_id: &str) -> StorageResult<Vec<Severity>>;

    /// Lists the issues of a site in insertion order
    ///
    /// # Arguments
    ///
    /// * `site_id` - The site to list
    /// * `unresolved_only` - Skip issues that have been marked resolved
    fn list_issues(&self, site_id: &str, unresolved_only: bool)
        -> StorageResult<Vec<IssueRecord>>;

    /// Marks an issue as resolved
    fn resolve_issue(&mut self, issue_id: i64) -> StorageResult<()>;

    // ===== Crawl Runs =====

    /// Records the start of a crawl
    ///
    /// # Returns
    ///
    /// The ID of the new run, in the `running` state
    fn begin_run(&mut self, site_id: &str, config_hash: &str) -> StorageResult<i64>;

    /// Closes a run with its final status
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        pages_visited: u32,
        health_score: Option<u8>,
    ) -> StorageResult<()>;

    /// Lists the runs of a site, newest first
    fn list_runs(&self, site_id: &str) -> StorageResult<Vec<RunRecord>>;
}
