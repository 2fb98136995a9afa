//! Course entity: the seat-capacity owner.

use capacita_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `courses` table.
///
/// `capacity_occupied` is written exclusively by the seat ledger; everything
/// else treats it as read-only.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Course {
    pub id: DbId,
    pub name: String,
    pub capacity_total: i32,
    pub capacity_occupied: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Course {
    /// Seats still available for official enrollment.
    pub fn seats_remaining(&self) -> i32 {
        self.capacity_total - self.capacity_occupied
    }
}

/// DTO for creating a new course.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCourse {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0))]
    pub capacity_total: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
