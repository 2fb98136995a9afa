//! Enrollment entity: the official, seat-consuming registration.

use capacita_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::status::StatusId;

/// A row from the `enrollments` table.
///
/// Created only by promotion from an approved, paid pre-registration.
/// `status_id` maps to `EnrollmentStatus`; the seat-count side effects on
/// creation and on withdrawal/reactivation are handled by the seat ledger
/// within the same transaction.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Enrollment {
    pub id: DbId,
    pub pre_registration_id: DbId,
    pub participant_id: DbId,
    pub course_id: DbId,
    pub status_id: StatusId,
    pub final_grade: Option<i16>,
    pub observations: Option<String>,
    pub withdrawal_reason: Option<String>,
    pub enrolled_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
