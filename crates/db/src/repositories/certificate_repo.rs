//! Repository for the `certificates` table.
//!
//! Eligibility is decided by `capacita_core::certificate` over a view
//! loaded here under the enrollment row lock. The verification code comes
//! from a generate-check-insert loop; the unique index on the code column
//! is the backstop against a concurrent insert winning the same code
//! between the check and the write.

use capacita_core::certificate::{
    check_eligibility, generate_verification_code, CertificateKind, EligibilityView, Ineligible,
};
use capacita_core::types::DbId;
use chrono::{Datelike, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::{constraints, RegistrarError};
use crate::models::certificate::Certificate;
use crate::models::report::BulkIssueReport;
use crate::models::status::{CertificateType, EnrollmentStatus};

/// Column list for `certificates` queries.
const COLUMNS: &str = "id, enrollment_id, certificate_type_id, verification_code, issued_at, \
    created_at, updated_at";

/// Attempts at finding an unused verification code before giving up. With
/// an eight-character alphanumeric suffix a second collision in a row
/// means something is broken, not unlucky.
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Enrollment fields read at issuance time.
#[derive(Debug, sqlx::FromRow)]
struct IssuanceSourceRow {
    status_id: i16,
    final_grade: Option<i16>,
}

/// Provides certificate issuance and verification lookups.
pub struct CertificateRepo;

impl CertificateRepo {
    /// Issue a certificate of `kind` for an enrollment.
    ///
    /// The eligibility matrix runs under the enrollment row lock, so two
    /// concurrent issue calls for the same enrollment serialize and the
    /// loser sees the certificate the winner created. The stored
    /// verification code is generated here once and never reassigned.
    pub async fn issue(
        pool: &PgPool,
        enrollment_id: DbId,
        kind: CertificateKind,
    ) -> Result<Certificate, RegistrarError> {
        let mut tx = pool.begin().await?;

        let row: IssuanceSourceRow = sqlx::query_as(
            "SELECT status_id, final_grade FROM enrollments WHERE id = $1 FOR UPDATE",
        )
        .bind(enrollment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RegistrarError::NotFound {
            entity: "enrollment",
            id: enrollment_id,
        })?;

        let has_certificate: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM certificates WHERE enrollment_id = $1")
                .bind(enrollment_id)
                .fetch_optional(&mut *tx)
                .await?;

        let view = EligibilityView {
            is_enrolled: row.status_id == EnrollmentStatus::Enrolled.id(),
            is_approved: row.status_id == EnrollmentStatus::Approved.id(),
            final_grade: row.final_grade,
            has_certificate: has_certificate.is_some(),
        };
        check_eligibility(kind, &view).map_err(|reason| match reason {
            Ineligible::AlreadyCertified => RegistrarError::Duplicate {
                constraint: constraints::CERTIFICATE_PER_ENROLLMENT.into(),
            },
            other => RegistrarError::Validation(other.to_string()),
        })?;

        let certificate =
            Self::insert_with_fresh_code(&mut tx, enrollment_id, CertificateType::from(kind))
                .await?;

        tx.commit().await?;

        tracing::debug!(
            enrollment_id,
            certificate_id = certificate.id,
            "certificate issued"
        );
        Ok(certificate)
    }

    /// Issue certificates of `kind` across a whole course.
    ///
    /// Applies the eligibility rule per enrollment; ineligible and
    /// already-certified enrollments are skipped silently and only counted.
    /// Each issuance runs in its own transaction.
    pub async fn issue_for_course(
        pool: &PgPool,
        course_id: DbId,
        kind: CertificateKind,
    ) -> Result<BulkIssueReport, RegistrarError> {
        let ids: Vec<(DbId,)> =
            sqlx::query_as("SELECT id FROM enrollments WHERE course_id = $1 ORDER BY id ASC")
                .bind(course_id)
                .fetch_all(pool)
                .await?;

        let mut report = BulkIssueReport::default();
        for (enrollment_id,) in ids {
            match Self::issue(pool, enrollment_id, kind).await {
                Ok(_) => report.issued += 1,
                Err(RegistrarError::Duplicate { .. }) | Err(RegistrarError::Validation(_)) => {
                    report.skipped += 1;
                }
                Err(other) => return Err(other),
            }
        }
        Ok(report)
    }

    /// The certificate for an enrollment, if one was issued.
    pub async fn find_by_enrollment(
        pool: &PgPool,
        enrollment_id: DbId,
    ) -> Result<Option<Certificate>, RegistrarError> {
        let query = format!("SELECT {COLUMNS} FROM certificates WHERE enrollment_id = $1");
        let certificate = sqlx::query_as::<_, Certificate>(&query)
            .bind(enrollment_id)
            .fetch_optional(pool)
            .await?;
        Ok(certificate)
    }

    /// Public authenticity lookup by verification code.
    pub async fn find_by_verification_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<Certificate>, RegistrarError> {
        let query = format!("SELECT {COLUMNS} FROM certificates WHERE verification_code = $1");
        let certificate = sqlx::query_as::<_, Certificate>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await?;
        Ok(certificate)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Generate-check-insert loop for the verification code.
    ///
    /// `ON CONFLICT (verification_code) DO NOTHING` keeps the transaction
    /// alive when a concurrent insert wins the candidate code between our
    /// check and our write; the loop then tries a fresh one. A conflict on
    /// the enrollment uniqueness still raises and is classified normally.
    async fn insert_with_fresh_code(
        tx: &mut Transaction<'_, Postgres>,
        enrollment_id: DbId,
        certificate_type: CertificateType,
    ) -> Result<Certificate, RegistrarError> {
        let year = Utc::now().year();

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_verification_code(year);

            let taken: Option<(DbId,)> =
                sqlx::query_as("SELECT id FROM certificates WHERE verification_code = $1")
                    .bind(&code)
                    .fetch_optional(&mut **tx)
                    .await?;
            if taken.is_some() {
                continue;
            }

            let query = format!(
                "INSERT INTO certificates (enrollment_id, certificate_type_id, verification_code) \
                 VALUES ($1, $2, $3) \
                 ON CONFLICT (verification_code) DO NOTHING \
                 RETURNING {COLUMNS}"
            );
            let inserted = sqlx::query_as::<_, Certificate>(&query)
                .bind(enrollment_id)
                .bind(certificate_type.id())
                .bind(&code)
                .fetch_optional(&mut **tx)
                .await?;

            if let Some(certificate) = inserted {
                return Ok(certificate);
            }
        }

        Err(RegistrarError::Duplicate {
            constraint: constraints::VERIFICATION_CODE.into(),
        })
    }
}
