//! Repository for the `pre_registrations` table: the PENDING →
//! APPROVED/REJECTED review machine.
//!
//! Every transition locks the pre-registration row first and re-checks the
//! current status under the lock. Approval does not consume a seat; it only
//! verifies that capacity exists at decision time. The seat itself is taken
//! at promotion.

use capacita_core::types::DbId;
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::RegistrarError;
use crate::models::pre_registration::{CreatePreRegistration, PreRegistration};
use crate::models::report::{BatchFailure, BatchOutcome};
use crate::models::status::PreRegistrationStatus;

/// Column list for `pre_registrations` queries.
const COLUMNS: &str =
    "id, participant_id, course_id, status_id, notes, status_changed_at, created_at, updated_at";

/// Course fields read at approval time.
#[derive(Debug, sqlx::FromRow)]
struct ApprovalCourseRow {
    capacity_total: i32,
    capacity_occupied: i32,
    start_date: NaiveDate,
}

/// Provides review operations for pre-registrations.
pub struct PreRegistrationRepo;

impl PreRegistrationRepo {
    /// Create a new pending pre-registration for a (participant, course)
    /// pair. A second request for the same pair surfaces as `Duplicate`.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePreRegistration,
    ) -> Result<PreRegistration, RegistrarError> {
        let query = format!(
            "INSERT INTO pre_registrations (participant_id, course_id, status_id, notes) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let pre = sqlx::query_as::<_, PreRegistration>(&query)
            .bind(input.participant_id)
            .bind(input.course_id)
            .bind(PreRegistrationStatus::Pending.id())
            .bind(&input.notes)
            .fetch_one(pool)
            .await?;
        Ok(pre)
    }

    /// Find a pre-registration by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PreRegistration>, RegistrarError> {
        let query = format!("SELECT {COLUMNS} FROM pre_registrations WHERE id = $1");
        let pre = sqlx::query_as::<_, PreRegistration>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(pre)
    }

    /// List pre-registrations for a course, optionally filtered by status,
    /// oldest first (review-queue order).
    pub async fn list_for_course(
        pool: &PgPool,
        course_id: DbId,
        status: Option<PreRegistrationStatus>,
    ) -> Result<Vec<PreRegistration>, RegistrarError> {
        let rows = match status {
            Some(status) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM pre_registrations \
                     WHERE course_id = $1 AND status_id = $2 \
                     ORDER BY created_at ASC"
                );
                sqlx::query_as::<_, PreRegistration>(&query)
                    .bind(course_id)
                    .bind(status.id())
                    .fetch_all(pool)
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM pre_registrations \
                     WHERE course_id = $1 \
                     ORDER BY created_at ASC"
                );
                sqlx::query_as::<_, PreRegistration>(&query)
                    .bind(course_id)
                    .fetch_all(pool)
                    .await?
            }
        };
        Ok(rows)
    }

    /// Approve a pending pre-registration.
    ///
    /// Requires, at decision time: status pending, course not yet started,
    /// and at least one seat free. No seat is reserved here; capacity is
    /// re-checked (and consumed) at promotion.
    pub async fn approve(
        pool: &PgPool,
        id: DbId,
        notes: Option<&str>,
    ) -> Result<PreRegistration, RegistrarError> {
        let mut tx = pool.begin().await?;

        let pre = Self::lock_for_review(&mut tx, id).await?;
        Self::require_status(&pre, PreRegistrationStatus::Pending, "approve")?;

        let course: ApprovalCourseRow = sqlx::query_as(
            "SELECT capacity_total, capacity_occupied, start_date FROM courses WHERE id = $1",
        )
        .bind(pre.course_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RegistrarError::NotFound {
            entity: "course",
            id: pre.course_id,
        })?;

        if course.capacity_occupied >= course.capacity_total {
            return Err(RegistrarError::CapacityExceeded {
                course_id: Some(pre.course_id),
            });
        }
        if course.start_date <= Utc::now().date_naive() {
            return Err(RegistrarError::CourseAlreadyStarted {
                course_id: pre.course_id,
            });
        }

        let query = format!(
            "UPDATE pre_registrations \
             SET status_id = $2, notes = COALESCE($3, notes), status_changed_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, PreRegistration>(&query)
            .bind(id)
            .bind(PreRegistrationStatus::Approved.id())
            .bind(notes)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Reject a pending pre-registration. The reason is mandatory and is
    /// recorded in the notes. Rejection is terminal.
    pub async fn reject(
        pool: &PgPool,
        id: DbId,
        reason: &str,
    ) -> Result<PreRegistration, RegistrarError> {
        if reason.trim().is_empty() {
            return Err(RegistrarError::Validation(
                "rejection reason must not be empty".into(),
            ));
        }

        let mut tx = pool.begin().await?;

        let pre = Self::lock_for_review(&mut tx, id).await?;
        Self::require_status(&pre, PreRegistrationStatus::Pending, "reject")?;

        let query = format!(
            "UPDATE pre_registrations \
             SET status_id = $2, notes = $3, status_changed_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, PreRegistration>(&query)
            .bind(id)
            .bind(PreRegistrationStatus::Rejected.id())
            .bind(reason)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Revert an approved pre-registration back to pending.
    ///
    /// Refused once an enrollment exists for this pre-registration, and for
    /// rejected rows (rejection is terminal). An existing payment is left
    /// untouched; re-approval and promotion will find it again.
    pub async fn revert_to_pending(
        pool: &PgPool,
        id: DbId,
    ) -> Result<PreRegistration, RegistrarError> {
        let mut tx = pool.begin().await?;

        let pre = Self::lock_for_review(&mut tx, id).await?;
        Self::require_status(&pre, PreRegistrationStatus::Approved, "revert")?;

        let enrollment: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM enrollments WHERE pre_registration_id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if enrollment.is_some() {
            return Err(RegistrarError::EnrollmentExists(id));
        }

        let query = format!(
            "UPDATE pre_registrations \
             SET status_id = $2, status_changed_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, PreRegistration>(&query)
            .bind(id)
            .bind(PreRegistrationStatus::Pending.id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Approve a batch of pre-registrations, best-effort.
    ///
    /// Each item runs in its own transaction; one item's failure never
    /// rolls back its siblings.
    pub async fn approve_batch(
        pool: &PgPool,
        ids: &[DbId],
        notes: Option<&str>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for &id in ids {
            match Self::approve(pool, id, notes).await {
                Ok(_) => outcome.succeeded.push(id),
                Err(err) => outcome.failed.push(BatchFailure {
                    id,
                    reason: err.to_string(),
                }),
            }
        }
        outcome
    }

    /// Reject a batch of pre-registrations, best-effort, all with the same
    /// mandatory reason.
    pub async fn reject_batch(
        pool: &PgPool,
        ids: &[DbId],
        reason: &str,
    ) -> Result<BatchOutcome, RegistrarError> {
        if reason.trim().is_empty() {
            return Err(RegistrarError::Validation(
                "rejection reason must not be empty".into(),
            ));
        }

        let mut outcome = BatchOutcome::default();
        for &id in ids {
            match Self::reject(pool, id, reason).await {
                Ok(_) => outcome.succeeded.push(id),
                Err(err) => outcome.failed.push(BatchFailure {
                    id,
                    reason: err.to_string(),
                }),
            }
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Lock the pre-registration row for the duration of the transaction.
    async fn lock_for_review(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<PreRegistration, RegistrarError> {
        let query = format!("SELECT {COLUMNS} FROM pre_registrations WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, PreRegistration>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(RegistrarError::NotFound {
                entity: "pre-registration",
                id,
            })
    }

    /// Require the row to be in `expected` status for `action`.
    fn require_status(
        pre: &PreRegistration,
        expected: PreRegistrationStatus,
        action: &'static str,
    ) -> Result<(), RegistrarError> {
        if pre.status_id == expected.id() {
            Ok(())
        } else {
            Err(RegistrarError::InvalidTransition {
                entity: "pre-registration",
                id: pre.id,
                current: PreRegistrationStatus::name_of(pre.status_id),
                action,
            })
        }
    }
}
