//! Repository for the `payments` table: payment capture and reconciliation.
//!
//! A payment requires an approved pre-registration, is unique per
//! pre-registration, and carries a globally unique receipt number. An
//! amount that deviates from the catalog price is recorded anyway and the
//! discrepancy is reported back to the caller.

use capacita_core::pricing;
use capacita_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};
use validator::Validate;

use crate::error::{constraints, RegistrarError};
use crate::models::payment::{EditPayment, Payment, PaymentRecorded, RecordPayment};
use crate::models::pre_registration::PreRegistration;
use crate::models::status::PreRegistrationStatus;
use crate::repositories::price_schedule_repo::PriceScheduleRepo;

/// Column list for `payments` queries.
const COLUMNS: &str =
    "id, pre_registration_id, amount_cents, receipt_number, paid_at, created_at, updated_at";

/// Provides payment capture and correction operations.
pub struct PaymentRepo;

impl PaymentRepo {
    /// Record a payment against an approved pre-registration.
    ///
    /// Gates, checked under the pre-registration row lock:
    /// - pre-registration status is approved,
    /// - no payment exists yet for this pre-registration,
    /// - the receipt number is not in use anywhere.
    ///
    /// The expected price comes from the active price schedule for the
    /// (course, participant type) pair; a missing schedule is a `NotFound`.
    /// A price mismatch never blocks the write — it is returned as
    /// `discrepancy` alongside the stored row.
    pub async fn record(
        pool: &PgPool,
        input: &RecordPayment,
    ) -> Result<PaymentRecorded, RegistrarError> {
        input.validate()?;

        let mut tx = pool.begin().await?;

        let pre = Self::lock_pre_registration(&mut tx, input.pre_registration_id).await?;
        if pre.status_id != PreRegistrationStatus::Approved.id() {
            return Err(RegistrarError::InvalidTransition {
                entity: "pre-registration",
                id: pre.id,
                current: PreRegistrationStatus::name_of(pre.status_id),
                action: "record a payment for",
            });
        }

        let existing: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM payments WHERE pre_registration_id = $1")
                .bind(pre.id)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Err(RegistrarError::Duplicate {
                constraint: constraints::PAYMENT_PER_PRE_REGISTRATION.into(),
            });
        }

        let receipt_taken: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM payments WHERE receipt_number = $1")
                .bind(&input.receipt_number)
                .fetch_optional(&mut *tx)
                .await?;
        if receipt_taken.is_some() {
            return Err(RegistrarError::Duplicate {
                constraint: constraints::RECEIPT_NUMBER.into(),
            });
        }

        let expected_cents =
            PriceScheduleRepo::expected_price_in_tx(&mut tx, pre.course_id, pre.participant_id)
                .await?
                .ok_or(RegistrarError::NotFound {
                    entity: "active price schedule for course",
                    id: pre.course_id,
                })?;

        let query = format!(
            "INSERT INTO payments (pre_registration_id, amount_cents, receipt_number, paid_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(pre.id)
            .bind(input.amount_cents)
            .bind(&input.receipt_number)
            .bind(input.paid_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        let discrepancy = pricing::discrepancy(expected_cents, payment.amount_cents);
        if let Some(d) = discrepancy {
            tracing::debug!(
                payment_id = payment.id,
                expected_cents = d.expected_cents,
                actual_cents = d.actual_cents,
                "payment recorded with price discrepancy"
            );
        }

        Ok(PaymentRecorded {
            payment,
            discrepancy,
        })
    }

    /// Correct a payment. Only non-`None` fields are applied.
    ///
    /// Refused once an enrollment exists for the same pre-registration —
    /// from that point the payment is part of the official record.
    pub async fn edit(
        pool: &PgPool,
        payment_id: DbId,
        input: &EditPayment,
    ) -> Result<Payment, RegistrarError> {
        input.validate()?;

        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1 FOR UPDATE");
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(payment_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RegistrarError::NotFound {
                entity: "payment",
                id: payment_id,
            })?;

        let enrollment: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM enrollments WHERE pre_registration_id = $1")
                .bind(payment.pre_registration_id)
                .fetch_optional(&mut *tx)
                .await?;
        if enrollment.is_some() {
            return Err(RegistrarError::EnrollmentExists(payment.pre_registration_id));
        }

        let query = format!(
            "UPDATE payments SET \
                amount_cents = COALESCE($2, amount_cents), \
                receipt_number = COALESCE($3, receipt_number), \
                paid_at = COALESCE($4, paid_at) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Payment>(&query)
            .bind(payment_id)
            .bind(input.amount_cents)
            .bind(&input.receipt_number)
            .bind(input.paid_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Find a payment by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Payment>, RegistrarError> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1");
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(payment)
    }

    /// The payment for a pre-registration, if one was recorded.
    pub async fn find_by_pre_registration(
        pool: &PgPool,
        pre_registration_id: DbId,
    ) -> Result<Option<Payment>, RegistrarError> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE pre_registration_id = $1");
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(pre_registration_id)
            .fetch_optional(pool)
            .await?;
        Ok(payment)
    }

    /// Look up a payment by receipt number.
    pub async fn find_by_receipt(
        pool: &PgPool,
        receipt_number: &str,
    ) -> Result<Option<Payment>, RegistrarError> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE receipt_number = $1");
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(receipt_number)
            .fetch_optional(pool)
            .await?;
        Ok(payment)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Lock the pre-registration row for the duration of the transaction.
    async fn lock_pre_registration(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<PreRegistration, RegistrarError> {
        sqlx::query_as::<_, PreRegistration>(
            "SELECT id, participant_id, course_id, status_id, notes, status_changed_at, \
                    created_at, updated_at \
             FROM pre_registrations WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RegistrarError::NotFound {
            entity: "pre-registration",
            id,
        })
    }
}
