//! Repository for the `price_schedules` table.

use capacita_core::types::{Cents, DbId};
use sqlx::{PgPool, Postgres, Transaction};
use validator::Validate;

use crate::error::RegistrarError;
use crate::models::price_schedule::{PriceSchedule, SetPrice};

/// Column list for `price_schedules` queries.
const COLUMNS: &str =
    "id, course_id, participant_type_id, amount_cents, is_active, created_at, updated_at";

/// Provides operations for catalog prices.
pub struct PriceScheduleRepo;

impl PriceScheduleRepo {
    /// Set the active price for a (course, participant type) pair.
    ///
    /// Deactivates any previous active row and inserts the new one in a
    /// single transaction, preserving the at-most-one-active invariant.
    /// Superseded rows stay behind for payment-history audits.
    pub async fn set_price(pool: &PgPool, input: &SetPrice) -> Result<PriceSchedule, RegistrarError> {
        input.validate()?;

        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE price_schedules SET is_active = false \
             WHERE course_id = $1 AND participant_type_id = $2 AND is_active = true",
        )
        .bind(input.course_id)
        .bind(input.participant_type_id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO price_schedules (course_id, participant_type_id, amount_cents) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        let schedule = sqlx::query_as::<_, PriceSchedule>(&query)
            .bind(input.course_id)
            .bind(input.participant_type_id)
            .bind(input.amount_cents)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(schedule)
    }

    /// The active price row for a (course, participant type) pair.
    pub async fn active_price(
        pool: &PgPool,
        course_id: DbId,
        participant_type_id: DbId,
    ) -> Result<Option<PriceSchedule>, RegistrarError> {
        let query = format!(
            "SELECT {COLUMNS} FROM price_schedules \
             WHERE course_id = $1 AND participant_type_id = $2 AND is_active = true"
        );
        let schedule = sqlx::query_as::<_, PriceSchedule>(&query)
            .bind(course_id)
            .bind(participant_type_id)
            .fetch_optional(pool)
            .await?;
        Ok(schedule)
    }

    /// Expected price for a participant on a course, resolved through the
    /// participant's type. Runs inside the caller's transaction so payment
    /// capture reads the price under its pre-registration lock.
    pub(crate) async fn expected_price_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        course_id: DbId,
        participant_id: DbId,
    ) -> Result<Option<Cents>, RegistrarError> {
        let amount: Option<(Cents,)> = sqlx::query_as(
            "SELECT ps.amount_cents \
             FROM price_schedules ps \
             JOIN participants p ON p.participant_type_id = ps.participant_type_id \
             WHERE ps.course_id = $1 AND p.id = $2 AND ps.is_active = true",
        )
        .bind(course_id)
        .bind(participant_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(amount.map(|row| row.0))
    }
}
