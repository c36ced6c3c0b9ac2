//! Audit module: what counts as an on-page defect and how defects are scored
//!
//! - `issue`: severity and issue-type vocabulary plus the stored issue record
//! - `detector`: the fixed rule table evaluated against each page snapshot
//! - `score`: the weighted-severity health score

mod detector;
mod issue;
mod score;

pub use detector::{
    detect_issues, META_DESCRIPTION_MAX_CHARS, SLOW_LOAD_MS, THIN_CONTENT_CHARS,
    TITLE_MAX_CHARS, TITLE_MIN_CHARS,
};
pub use issue::{Finding, Issue, IssueType, Severity};
pub use score::{health_score, PERFECT_SCORE};
