//! Integration tests for certificate issuance.
//!
//! - The eligibility matrix enforced under the enrollment lock
//! - Verification-code format and the public authenticity lookup
//! - Double issuance refused
//! - Bulk issuance counts over a mixed course

use assert_matches::assert_matches;
use sqlx::PgPool;

use capacita_core::certificate::{CertificateKind, CODE_PREFIX};
use capacita_db::error::{constraints, RegistrarError};
use capacita_db::models::status::CertificateType;
use capacita_db::repositories::{CertificateRepo, EnrollmentRepo};

mod common;

// ---------------------------------------------------------------------------
// Issuance
// ---------------------------------------------------------------------------

/// Approved with a 95: honor mention is issued with a well-formed, unique
/// code; a second issue call is refused.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_honor_mention_issued_once(pool: PgPool) {
    let (_, _, enrollment) = common::paid_enrollment(&pool, "c1", 5).await;
    EnrollmentRepo::set_final_grade(&pool, enrollment.id, 95).await.unwrap();

    let certificate = CertificateRepo::issue(&pool, enrollment.id, CertificateKind::HonorMention)
        .await
        .unwrap();

    assert_eq!(certificate.certificate_type_id, CertificateType::HonorMention.id());
    assert!(!certificate.verification_code.is_empty());
    assert!(certificate.verification_code.starts_with(CODE_PREFIX));

    let err = CertificateRepo::issue(&pool, enrollment.id, CertificateKind::HonorMention)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        RegistrarError::Duplicate { ref constraint }
            if constraint == constraints::CERTIFICATE_PER_ENROLLMENT
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_participation_allowed_while_enrolled(pool: PgPool) {
    let (_, _, enrollment) = common::paid_enrollment(&pool, "c2", 5).await;

    let certificate = CertificateRepo::issue(&pool, enrollment.id, CertificateKind::Participation)
        .await
        .unwrap();

    assert_eq!(certificate.certificate_type_id, CertificateType::Participation.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approval_requires_passing(pool: PgPool) {
    let (_, _, enrollment) = common::paid_enrollment(&pool, "c3", 5).await;

    let err = CertificateRepo::issue(&pool, enrollment.id, CertificateKind::Approval)
        .await
        .unwrap_err();
    assert_matches!(err, RegistrarError::Validation(_));

    EnrollmentRepo::set_final_grade(&pool, enrollment.id, 60).await.unwrap();
    CertificateRepo::issue(&pool, enrollment.id, CertificateKind::Approval)
        .await
        .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_honor_mention_needs_ninety(pool: PgPool) {
    let (_, _, enrollment) = common::paid_enrollment(&pool, "c4", 5).await;
    EnrollmentRepo::set_final_grade(&pool, enrollment.id, 89).await.unwrap();

    let err = CertificateRepo::issue(&pool, enrollment.id, CertificateKind::HonorMention)
        .await
        .unwrap_err();

    assert_matches!(err, RegistrarError::Validation(_));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_enrollment_gets_nothing(pool: PgPool) {
    let (_, _, enrollment) = common::paid_enrollment(&pool, "c5", 5).await;
    EnrollmentRepo::set_final_grade(&pool, enrollment.id, 30).await.unwrap();

    for kind in [
        CertificateKind::Participation,
        CertificateKind::Approval,
        CertificateKind::HonorMention,
    ] {
        let err = CertificateRepo::issue(&pool, enrollment.id, kind).await.unwrap_err();
        assert_matches!(err, RegistrarError::Validation(_));
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_issue_unknown_enrollment_not_found(pool: PgPool) {
    let err = CertificateRepo::issue(&pool, 707070, CertificateKind::Participation)
        .await
        .unwrap_err();
    assert_matches!(err, RegistrarError::NotFound { entity: "enrollment", .. });
}

// ---------------------------------------------------------------------------
// Bulk issuance
// ---------------------------------------------------------------------------

/// Mixed course: two passed (one already certified), one failed. Bulk
/// approval issuance issues one and counts the rest as skipped.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bulk_issuance_counts(pool: PgPool) {
    let course = common::create_course(&pool, "c6", 10).await;

    let (_, passed) = common::add_pending_participant(&pool, "c6-a", &course).await;
    let (_, certified) = common::add_pending_participant(&pool, "c6-b", &course).await;
    let (_, failed) = common::add_pending_participant(&pool, "c6-c", &course).await;

    common::approve_and_pay(&pool, passed.id, "c6-a", common::DEFAULT_PRICE_CENTS).await;
    common::approve_and_pay(&pool, certified.id, "c6-b", common::DEFAULT_PRICE_CENTS).await;
    common::approve_and_pay(&pool, failed.id, "c6-c", common::DEFAULT_PRICE_CENTS).await;

    let passed_enrollment = EnrollmentRepo::promote(&pool, passed.id, None).await.unwrap();
    let certified_enrollment = EnrollmentRepo::promote(&pool, certified.id, None).await.unwrap();
    let failed_enrollment = EnrollmentRepo::promote(&pool, failed.id, None).await.unwrap();

    EnrollmentRepo::set_final_grade(&pool, passed_enrollment.id, 75).await.unwrap();
    EnrollmentRepo::set_final_grade(&pool, certified_enrollment.id, 80).await.unwrap();
    EnrollmentRepo::set_final_grade(&pool, failed_enrollment.id, 20).await.unwrap();

    CertificateRepo::issue(&pool, certified_enrollment.id, CertificateKind::Approval)
        .await
        .unwrap();

    let report = CertificateRepo::issue_for_course(&pool, course.id, CertificateKind::Approval)
        .await
        .unwrap();

    assert_eq!(report.issued, 1, "only the uncertified passer gets one");
    assert_eq!(report.skipped, 2, "already-certified and failed are skipped");
}

// ---------------------------------------------------------------------------
// Verification lookup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_verification_code_lookup(pool: PgPool) {
    let (_, _, enrollment) = common::paid_enrollment(&pool, "c7", 5).await;
    let certificate = CertificateRepo::issue(&pool, enrollment.id, CertificateKind::Participation)
        .await
        .unwrap();

    let found = CertificateRepo::find_by_verification_code(&pool, &certificate.verification_code)
        .await
        .unwrap();
    assert_eq!(found.map(|c| c.id), Some(certificate.id));

    let missing = CertificateRepo::find_by_verification_code(&pool, "CERT-1999-NOPE0000")
        .await
        .unwrap();
    assert!(missing.is_none());

    let by_enrollment = CertificateRepo::find_by_enrollment(&pool, enrollment.id)
        .await
        .unwrap();
    assert_eq!(by_enrollment.map(|c| c.id), Some(certificate.id));
}
