//! Repository for the `courses` table.
//!
//! Seat-count mutation lives in `SeatLedger`, not here.

use capacita_core::types::DbId;
use sqlx::PgPool;
use validator::Validate;

use crate::error::RegistrarError;
use crate::models::course::{Course, CreateCourse};
use crate::models::status::EnrollmentStatus;

/// Column list for `courses` queries.
const COLUMNS: &str = "id, name, capacity_total, capacity_occupied, start_date, end_date, \
    is_active, created_at, updated_at";

/// Provides CRUD operations for courses.
pub struct CourseRepo;

impl CourseRepo {
    /// Insert a new course with zero occupied seats.
    pub async fn create(pool: &PgPool, input: &CreateCourse) -> Result<Course, RegistrarError> {
        input.validate()?;

        let query = format!(
            "INSERT INTO courses (name, capacity_total, start_date, end_date) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let course = sqlx::query_as::<_, Course>(&query)
            .bind(&input.name)
            .bind(input.capacity_total)
            .bind(input.start_date)
            .bind(input.end_date)
            .fetch_one(pool)
            .await?;
        Ok(course)
    }

    /// Find a course by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Course>, RegistrarError> {
        let query = format!("SELECT {COLUMNS} FROM courses WHERE id = $1");
        let course = sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(course)
    }

    /// List active courses ordered by start date.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Course>, RegistrarError> {
        let query = format!(
            "SELECT {COLUMNS} FROM courses WHERE is_active = true ORDER BY start_date, name"
        );
        let courses = sqlx::query_as::<_, Course>(&query).fetch_all(pool).await?;
        Ok(courses)
    }

    /// Deactivate a course. Refused while any non-withdrawn enrollment
    /// remains. Returns `true` if the course was deactivated, `false` if it
    /// was already inactive.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, RegistrarError> {
        let mut tx = pool.begin().await?;

        let active_enrollment: Option<(DbId,)> = sqlx::query_as(
            "SELECT id FROM enrollments WHERE course_id = $1 AND status_id != $2 LIMIT 1",
        )
        .bind(id)
        .bind(EnrollmentStatus::Withdrawn.id())
        .fetch_optional(&mut *tx)
        .await?;

        if active_enrollment.is_some() {
            return Err(RegistrarError::Validation(format!(
                "course {id} still has active enrollments"
            )));
        }

        let result = sqlx::query("UPDATE courses SET is_active = false WHERE id = $1 AND is_active = true")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
