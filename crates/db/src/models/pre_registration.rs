//! Pre-registration entity and review DTOs.

use capacita_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::status::StatusId;

/// A row from the `pre_registrations` table.
///
/// One per (participant, course) pair. `status_id` maps to
/// `PreRegistrationStatus`; `status_changed_at` tracks the latest review
/// decision.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PreRegistration {
    pub id: DbId,
    pub participant_id: DbId,
    pub course_id: DbId,
    pub status_id: StatusId,
    pub notes: Option<String>,
    pub status_changed_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new pre-registration (participant-facing intake).
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePreRegistration {
    pub participant_id: DbId,
    pub course_id: DbId,
    pub notes: Option<String>,
}
