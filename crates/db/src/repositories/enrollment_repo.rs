//! Repository for the `enrollments` table: promotion from an approved,
//! paid pre-registration into an official, seat-consuming enrollment, and
//! the enrolled → approved/failed/withdrawn lifecycle after it.
//!
//! Promotion runs as one transaction: pre-registration lock, gate checks,
//! seat reservation (course row lock), row insert. Reservation and insert
//! commit or roll back together, so a failed insert can never leak a seat.

use capacita_core::grading::{self, Grade, GradeOutcome};
use capacita_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::RegistrarError;
use crate::models::enrollment::Enrollment;
use crate::models::report::{BatchFailure, BatchPromotionReport};
use crate::models::status::{EnrollmentStatus, PreRegistrationStatus};
use crate::repositories::seat_ledger::SeatLedger;

/// Column list for `enrollments` queries.
const COLUMNS: &str = "id, pre_registration_id, participant_id, course_id, status_id, \
    final_grade, observations, withdrawal_reason, enrolled_at, created_at, updated_at";

/// Pre-registration fields read at promotion time.
#[derive(Debug, sqlx::FromRow)]
struct PromotionSourceRow {
    id: DbId,
    participant_id: DbId,
    course_id: DbId,
    status_id: i16,
}

/// Provides enrollment promotion and lifecycle operations.
pub struct EnrollmentRepo;

impl EnrollmentRepo {
    /// Promote an approved, paid pre-registration into an enrollment.
    ///
    /// All gates are checked inside one transaction with the
    /// pre-registration row locked; the seat is consumed via
    /// [`SeatLedger::reserve`] (course row lock) immediately before the
    /// insert. Two concurrent promotions against the last seat serialize on
    /// the course row and exactly one succeeds.
    pub async fn promote(
        pool: &PgPool,
        pre_registration_id: DbId,
        observations: Option<&str>,
    ) -> Result<Enrollment, RegistrarError> {
        let mut tx = pool.begin().await?;

        let pre: PromotionSourceRow = sqlx::query_as(
            "SELECT id, participant_id, course_id, status_id \
             FROM pre_registrations WHERE id = $1 FOR UPDATE",
        )
        .bind(pre_registration_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RegistrarError::NotFound {
            entity: "pre-registration",
            id: pre_registration_id,
        })?;

        if pre.status_id != PreRegistrationStatus::Approved.id() {
            return Err(RegistrarError::InvalidTransition {
                entity: "pre-registration",
                id: pre.id,
                current: PreRegistrationStatus::name_of(pre.status_id),
                action: "promote",
            });
        }

        let payment: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM payments WHERE pre_registration_id = $1")
                .bind(pre.id)
                .fetch_optional(&mut *tx)
                .await?;
        if payment.is_none() {
            return Err(RegistrarError::MissingPayment(pre.id));
        }

        let existing: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM enrollments WHERE pre_registration_id = $1")
                .bind(pre.id)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Err(RegistrarError::EnrollmentExists(pre.id));
        }

        SeatLedger::reserve(&mut tx, pre.course_id).await?;

        let query = format!(
            "INSERT INTO enrollments \
                (pre_registration_id, participant_id, course_id, status_id, observations) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let enrollment = sqlx::query_as::<_, Enrollment>(&query)
            .bind(pre.id)
            .bind(pre.participant_id)
            .bind(pre.course_id)
            .bind(EnrollmentStatus::Enrolled.id())
            .bind(observations)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            enrollment_id = enrollment.id,
            pre_registration_id = pre.id,
            course_id = pre.course_id,
            "pre-registration promoted to enrollment"
        );
        Ok(enrollment)
    }

    /// Promote a batch of pre-registrations, best-effort.
    ///
    /// Each item runs in its own transaction; seat exhaustion on one item
    /// never blocks or rolls back its siblings. The report carries the
    /// created enrollment ids and the per-item failure reasons.
    pub async fn promote_batch(pool: &PgPool, ids: &[DbId]) -> BatchPromotionReport {
        let mut report = BatchPromotionReport::default();
        for &id in ids {
            match Self::promote(pool, id, None).await {
                Ok(enrollment) => report.promoted.push(enrollment.id),
                Err(err) => report.failed.push(BatchFailure {
                    id,
                    reason: err.to_string(),
                }),
            }
        }
        report
    }

    /// Record a final grade and derive the resulting status.
    ///
    /// Grade ≥ the passing threshold moves the enrollment to approved,
    /// anything lower to failed. Re-grading is allowed and re-evaluates the
    /// status each time. Withdrawn enrollments cannot be graded; they must
    /// be reactivated first.
    pub async fn set_final_grade(
        pool: &PgPool,
        enrollment_id: DbId,
        grade: Grade,
    ) -> Result<Enrollment, RegistrarError> {
        grading::validate_grade(grade)?;

        let mut tx = pool.begin().await?;

        let enrollment = Self::lock_enrollment(&mut tx, enrollment_id).await?;
        if enrollment.status_id == EnrollmentStatus::Withdrawn.id() {
            return Err(RegistrarError::InvalidTransition {
                entity: "enrollment",
                id: enrollment.id,
                current: EnrollmentStatus::name_of(enrollment.status_id),
                action: "grade",
            });
        }

        let status = match grading::evaluate_grade(grade) {
            GradeOutcome::Passed => EnrollmentStatus::Approved,
            GradeOutcome::Failed => EnrollmentStatus::Failed,
        };

        let query = format!(
            "UPDATE enrollments SET final_grade = $2, status_id = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Enrollment>(&query)
            .bind(enrollment_id)
            .bind(grade)
            .bind(status.id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Withdraw an enrollment, releasing its seat in the same transaction.
    /// The reason is mandatory.
    pub async fn withdraw(
        pool: &PgPool,
        enrollment_id: DbId,
        reason: &str,
    ) -> Result<Enrollment, RegistrarError> {
        if reason.trim().is_empty() {
            return Err(RegistrarError::Validation(
                "withdrawal reason must not be empty".into(),
            ));
        }

        let mut tx = pool.begin().await?;

        let enrollment = Self::lock_enrollment(&mut tx, enrollment_id).await?;
        if enrollment.status_id == EnrollmentStatus::Withdrawn.id() {
            return Err(RegistrarError::InvalidTransition {
                entity: "enrollment",
                id: enrollment.id,
                current: EnrollmentStatus::name_of(enrollment.status_id),
                action: "withdraw",
            });
        }

        SeatLedger::release(&mut tx, enrollment.course_id).await?;

        let query = format!(
            "UPDATE enrollments SET status_id = $2, withdrawal_reason = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Enrollment>(&query)
            .bind(enrollment_id)
            .bind(EnrollmentStatus::Withdrawn.id())
            .bind(reason)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(enrollment_id, "enrollment withdrawn, seat released");
        Ok(updated)
    }

    /// Bring a withdrawn enrollment back, re-consuming a seat.
    ///
    /// The seat is reserved before the status write; when the course has
    /// refilled in the meantime, `CapacityExceeded` rolls the whole
    /// transition back and the enrollment stays withdrawn.
    pub async fn reactivate(
        pool: &PgPool,
        enrollment_id: DbId,
        target_status: EnrollmentStatus,
    ) -> Result<Enrollment, RegistrarError> {
        if target_status == EnrollmentStatus::Withdrawn {
            return Err(RegistrarError::Validation(
                "reactivation target must be a non-withdrawn status".into(),
            ));
        }

        let mut tx = pool.begin().await?;

        let enrollment = Self::lock_enrollment(&mut tx, enrollment_id).await?;
        if enrollment.status_id != EnrollmentStatus::Withdrawn.id() {
            return Err(RegistrarError::InvalidTransition {
                entity: "enrollment",
                id: enrollment.id,
                current: EnrollmentStatus::name_of(enrollment.status_id),
                action: "reactivate",
            });
        }

        SeatLedger::reserve(&mut tx, enrollment.course_id).await?;

        let query = format!(
            "UPDATE enrollments SET status_id = $2, withdrawal_reason = NULL \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Enrollment>(&query)
            .bind(enrollment_id)
            .bind(target_status.id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(enrollment_id, "enrollment reactivated, seat re-consumed");
        Ok(updated)
    }

    /// Find an enrollment by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Enrollment>, RegistrarError> {
        let query = format!("SELECT {COLUMNS} FROM enrollments WHERE id = $1");
        let enrollment = sqlx::query_as::<_, Enrollment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(enrollment)
    }

    /// The enrollment created from a pre-registration, if any.
    pub async fn find_by_pre_registration(
        pool: &PgPool,
        pre_registration_id: DbId,
    ) -> Result<Option<Enrollment>, RegistrarError> {
        let query = format!("SELECT {COLUMNS} FROM enrollments WHERE pre_registration_id = $1");
        let enrollment = sqlx::query_as::<_, Enrollment>(&query)
            .bind(pre_registration_id)
            .fetch_optional(pool)
            .await?;
        Ok(enrollment)
    }

    /// List enrollments for a course, optionally filtered by status.
    pub async fn list_for_course(
        pool: &PgPool,
        course_id: DbId,
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<Enrollment>, RegistrarError> {
        let rows = match status {
            Some(status) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM enrollments \
                     WHERE course_id = $1 AND status_id = $2 \
                     ORDER BY enrolled_at ASC"
                );
                sqlx::query_as::<_, Enrollment>(&query)
                    .bind(course_id)
                    .bind(status.id())
                    .fetch_all(pool)
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM enrollments \
                     WHERE course_id = $1 \
                     ORDER BY enrolled_at ASC"
                );
                sqlx::query_as::<_, Enrollment>(&query)
                    .bind(course_id)
                    .fetch_all(pool)
                    .await?
            }
        };
        Ok(rows)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Lock the enrollment row for the duration of the transaction.
    async fn lock_enrollment(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Enrollment, RegistrarError> {
        let query = format!("SELECT {COLUMNS} FROM enrollments WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(RegistrarError::NotFound {
                entity: "enrollment",
                id,
            })
    }
}
