//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the IssueStore trait.

use crate::audit::{Issue, IssueType, Severity};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{IssueStore, SiteUpdate, StorageError, StorageResult};
use crate::storage::{IssueRecord, RunRecord, RunStatus, SiteRecord};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Parses an RFC 3339 column value
fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_optional_timestamp(
    idx: usize,
    value: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(idx, &v)).transpose()
}

fn unknown_value(idx: usize, what: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("Unknown {} '{}'", what, value).into(),
    )
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
    Ok(SiteRecord {
        id: row.get(0)?,
        domain: row.get(1)?,
        last_crawled_at: parse_optional_timestamp(2, row.get(2)?)?,
        health_score: row.get(3)?,
        created_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
    })
}

fn issue_from_row(row: &Row<'_>) -> rusqlite::Result<IssueRecord> {
    let issue_type: String = row.get(3)?;
    let severity: String = row.get(4)?;

    Ok(IssueRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        page_url: row.get(2)?,
        issue_type: IssueType::from_db_string(&issue_type)
            .ok_or_else(|| unknown_value(3, "issue type", &issue_type))?,
        severity: Severity::from_db_string(&severity)
            .ok_or_else(|| unknown_value(4, "severity", &severity))?,
        description: row.get(5)?,
        suggested_fix: row.get(6)?,
        resolved: row.get(7)?,
        created_at: parse_timestamp(8, &row.get::<_, String>(8)?)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let status: String = row.get(5)?;

    Ok(RunRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        started_at: parse_timestamp(2, &row.get::<_, String>(2)?)?,
        finished_at: parse_optional_timestamp(3, row.get(3)?)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&status)
            .ok_or_else(|| unknown_value(5, "run status", &status))?,
        pages_visited: row.get(6)?,
        health_score: row.get(7)?,
    })
}

impl IssueStore for SqliteStorage {
    // ===== Sites =====

    fn ensure_site(&mut self, site_id: &str, domain: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR IGNORE INTO sites (id, domain, created_at) VALUES (?1, ?2, ?3)",
            params![site_id, domain, now],
        )?;
        Ok(())
    }

    fn get_site(&self, site_id: &str) -> StorageResult<Option<SiteRecord>> {
        let site = self
            .conn
            .query_row(
                "SELECT id, domain, last_crawled_at, health_score, created_at
                 FROM sites WHERE id = ?1",
                params![site_id],
                site_from_row,
            )
            .optional()?;

        Ok(site)
    }

    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, domain, last_crawled_at, health_score, created_at
             FROM sites ORDER BY id",
        )?;

        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sites)
    }

    fn update_site(&mut self, site_id: &str, update: SiteUpdate) -> StorageResult<()> {
        // A single statement, so concurrent score writes for a site serialize in SQLite
        let updated = self.conn.execute(
            "UPDATE sites
             SET last_crawled_at = COALESCE(?1, last_crawled_at),
                 health_score = COALESCE(?2, health_score)
             WHERE id = ?3",
            params![
                update.last_crawled_at.map(|t| t.to_rfc3339()),
                update.health_score,
                site_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::SiteNotFound(site_id.to_string()));
        }

        Ok(())
    }

    // ===== Issues =====

    fn insert_issue(&mut self, issue: &Issue) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO seo_issues
             (site_id, page_url, issue_type, severity, description, suggested_fix, resolved, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                issue.site_id,
                issue.page_url,
                issue.issue_type.to_db_string(),
                issue.severity.to_db_string(),
                issue.description,
                issue.suggested_fix,
                issue.resolved,
                issue.created_at.to_rfc3339(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn query_unresolved_severities(&self, site_id: &str) -> StorageResult<Vec<Severity>> {
        let mut stmt = self
            .conn
            .prepare("SELECT severity FROM seo_issues WHERE site_id = ?1 AND resolved = 0")?;

        let rows = stmt
            .query_map(params![site_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|s| {
                Severity::from_db_string(s)
                    .ok_or_else(|| StorageError::Serialization(format!("Unknown severity '{}'", s)))
            })
            .collect()
    }

    fn list_issues(
        &self,
        site_id: &str,
        unresolved_only: bool,
    ) -> StorageResult<Vec<IssueRecord>> {
        let sql = if unresolved_only {
            "SELECT id, site_id, page_url, issue_type, severity, description, suggested_fix,
             resolved, created_at
             FROM seo_issues WHERE site_id = ?1 AND resolved = 0 ORDER BY id"
        } else {
            "SELECT id, site_id, page_url, issue_type, severity, description, suggested_fix,
             resolved, created_at
             FROM seo_issues WHERE site_id = ?1 ORDER BY id"
        };

        let mut stmt = self.conn.prepare(sql)?;
        let issues = stmt
            .query_map(params![site_id], issue_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(issues)
    }

    fn resolve_issue(&mut self, issue_id: i64) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE seo_issues SET resolved = 1 WHERE id = ?1",
            params![issue_id],
        )?;

        if updated == 0 {
            return Err(StorageError::IssueNotFound(issue_id));
        }

        Ok(())
    }

    // ===== Crawl Runs =====

    fn begin_run(&mut self, site_id: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawl_runs (site_id, started_at, config_hash, status)
             VALUES (?1, ?2, ?3, ?4)",
            params![site_id, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        pages_visited: u32,
        health_score: Option<u8>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE crawl_runs
             SET status = ?1, finished_at = ?2, pages_visited = ?3, health_score = ?4
             WHERE id = ?5",
            params![status.to_db_string(), now, pages_visited, health_score, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::Database(format!("Run {} not found", run_id)));
        }

        Ok(())
    }

    fn list_runs(&self, site_id: &str) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, site_id, started_at, finished_at, config_hash, status, pages_visited,
             health_score
             FROM crawl_runs WHERE site_id = ?1 ORDER BY id DESC",
        )?;

        let runs = stmt
            .query_map(params![site_id], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }
}
