//! Result reports for batch and bulk operations.
//!
//! Batch operations are best-effort: each item runs in its own transaction
//! and one item's failure never rolls back its siblings. These types carry
//! the per-item outcomes back to the caller.

use capacita_core::types::DbId;
use serde::Serialize;

/// A single item that failed within a batch, with the business reason.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub id: DbId,
    pub reason: String,
}

/// Outcome of a batch review operation (approve/reject).
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub succeeded: Vec<DbId>,
    pub failed: Vec<BatchFailure>,
}

/// Outcome of a batch promotion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchPromotionReport {
    /// Ids of the enrollments created, in input order.
    pub promoted: Vec<DbId>,
    pub failed: Vec<BatchFailure>,
}

/// Outcome of bulk certificate issuance over a course.
///
/// Ineligible enrollments are skipped silently and only counted.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BulkIssueReport {
    pub issued: usize,
    pub skipped: usize,
}
