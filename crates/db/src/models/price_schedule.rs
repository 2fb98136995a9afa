//! Price schedule entity: per (course, participant type) catalog price.

use capacita_core::types::{Cents, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `price_schedules` table.
///
/// At most one active row exists per (course, participant type); superseded
/// rows are kept inactive for payment-history audits.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PriceSchedule {
    pub id: DbId,
    pub course_id: DbId,
    pub participant_type_id: DbId,
    pub amount_cents: Cents,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for setting the active price of a (course, participant type) pair.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetPrice {
    pub course_id: DbId,
    pub participant_type_id: DbId,
    #[validate(range(min = 0))]
    pub amount_cents: Cents,
}
