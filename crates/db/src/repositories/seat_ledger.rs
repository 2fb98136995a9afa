//! The seat ledger: sole writer of `courses.capacity_occupied`.
//!
//! Every reservation and release locks the course row first
//! (`SELECT ... FOR UPDATE`), checks the capacity invariant under the lock,
//! and mutates the counter in the same transaction. Higher-level operations
//! compose the transaction-scoped methods into their own atomic scope; the
//! `_with_pool` wrappers exist for callers without a transaction in flight.
//!
//! The schema's `ck_courses_capacity_within_bounds` check is the storage
//! backstop; the ledger never relies on it in the happy path.

use capacita_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::RegistrarError;

/// Capacity snapshot of a course row, taken under its row lock.
#[derive(Debug, sqlx::FromRow)]
struct CapacityRow {
    capacity_total: i32,
    capacity_occupied: i32,
}

/// Atomic reserve/release operations on course seat capacity.
pub struct SeatLedger;

impl SeatLedger {
    /// Lock the course row and return its capacity snapshot.
    async fn lock_course(
        tx: &mut Transaction<'_, Postgres>,
        course_id: DbId,
    ) -> Result<CapacityRow, RegistrarError> {
        sqlx::query_as::<_, CapacityRow>(
            "SELECT capacity_total, capacity_occupied FROM courses WHERE id = $1 FOR UPDATE",
        )
        .bind(course_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RegistrarError::NotFound {
            entity: "course",
            id: course_id,
        })
    }

    /// Consume one seat, failing with `CapacityExceeded` when the course is
    /// full. Check and increment happen under the course row lock, so two
    /// concurrent reservations for the last seat serialize and exactly one
    /// succeeds.
    pub async fn reserve(
        tx: &mut Transaction<'_, Postgres>,
        course_id: DbId,
    ) -> Result<(), RegistrarError> {
        let row = Self::lock_course(tx, course_id).await?;

        if row.capacity_occupied >= row.capacity_total {
            return Err(RegistrarError::CapacityExceeded {
                course_id: Some(course_id),
            });
        }

        sqlx::query("UPDATE courses SET capacity_occupied = capacity_occupied + 1 WHERE id = $1")
            .bind(course_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Return one seat, floored at zero.
    ///
    /// A release against an already-empty counter indicates a bookkeeping
    /// bug upstream; it is logged and clamped, never a panic and never a
    /// negative counter.
    pub async fn release(
        tx: &mut Transaction<'_, Postgres>,
        course_id: DbId,
    ) -> Result<(), RegistrarError> {
        let row = Self::lock_course(tx, course_id).await?;

        if row.capacity_occupied == 0 {
            tracing::warn!(course_id, "seat release on a course with zero occupied seats");
            return Ok(());
        }

        sqlx::query("UPDATE courses SET capacity_occupied = capacity_occupied - 1 WHERE id = $1")
            .bind(course_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Reserve a seat in its own one-shot transaction.
    pub async fn reserve_with_pool(pool: &PgPool, course_id: DbId) -> Result<(), RegistrarError> {
        let mut tx = pool.begin().await?;
        Self::reserve(&mut tx, course_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Release a seat in its own one-shot transaction.
    pub async fn release_with_pool(pool: &PgPool, course_id: DbId) -> Result<(), RegistrarError> {
        let mut tx = pool.begin().await?;
        Self::release(&mut tx, course_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Current `(occupied, total)` for a course. Unlocked read for
    /// dashboards and tests; do not base a reservation decision on it.
    pub async fn occupancy(pool: &PgPool, course_id: DbId) -> Result<(i32, i32), RegistrarError> {
        let row = sqlx::query_as::<_, CapacityRow>(
            "SELECT capacity_total, capacity_occupied FROM courses WHERE id = $1",
        )
        .bind(course_id)
        .fetch_optional(pool)
        .await?
        .ok_or(RegistrarError::NotFound {
            entity: "course",
            id: course_id,
        })?;

        Ok((row.capacity_occupied, row.capacity_total))
    }
}
