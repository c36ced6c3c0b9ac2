//! Health score aggregation

use crate::audit::issue::Severity;

/// Score of a site with no unresolved issues
pub const PERFECT_SCORE: u8 = 100;

/// Condenses unresolved issue severities into a 0-100 health score
///
/// Each issue subtracts its severity penalty from 100 (critical 20, high 10,
/// medium 5, low 2). The result never drops below zero. Order does not matter.
///
/// ```
/// use site_audit::audit::{health_score, Severity};
///
/// assert_eq!(health_score([Severity::High, Severity::Medium, Severity::Low]), 83);
/// ```
pub fn health_score<I>(severities: I) -> u8
where
    I: IntoIterator<Item = Severity>,
{
    let penalty: u64 = severities
        .into_iter()
        .map(|severity| u64::from(severity.penalty()))
        .sum();

    u64::from(PERFECT_SCORE).saturating_sub(penalty) as u8
}
