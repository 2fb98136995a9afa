//! Integration tests for the pre-registration review machine.
//!
//! Exercises approve/reject/revert against a real database:
//! - Status gates and the capacity/start-date checks at approval time
//! - Reject idempotence (second call fails, state unchanged)
//! - Revert guards (already pending, rejected terminal, enrollment exists)
//! - Best-effort batch semantics

use assert_matches::assert_matches;
use sqlx::PgPool;

use capacita_db::error::{constraints, RegistrarError};
use capacita_db::models::pre_registration::CreatePreRegistration;
use capacita_db::models::status::PreRegistrationStatus;
use capacita_db::repositories::{EnrollmentRepo, PaymentRepo, PreRegistrationRepo, SeatLedger};

mod common;

// ---------------------------------------------------------------------------
// Approve
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_pending_succeeds(pool: PgPool) {
    let (_, _, pre) = common::pending_pre_registration(&pool, "a1", 5).await;

    let approved = PreRegistrationRepo::approve(&pool, pre.id, Some("seat confirmed"))
        .await
        .unwrap();

    assert_eq!(approved.status_id, PreRegistrationStatus::Approved.id());
    assert_eq!(approved.notes.as_deref(), Some("seat confirmed"));
    assert!(approved.status_changed_at >= pre.status_changed_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_twice_fails(pool: PgPool) {
    let (_, _, pre) = common::pending_pre_registration(&pool, "a2", 5).await;

    PreRegistrationRepo::approve(&pool, pre.id, None).await.unwrap();
    let err = PreRegistrationRepo::approve(&pool, pre.id, None)
        .await
        .unwrap_err();

    assert_matches!(err, RegistrarError::InvalidTransition { current: "approved", .. });
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_full_course_fails(pool: PgPool) {
    let (course, _, pre) = common::pending_pre_registration(&pool, "a3", 1).await;
    SeatLedger::reserve_with_pool(&pool, course.id).await.unwrap();

    let err = PreRegistrationRepo::approve(&pool, pre.id, None)
        .await
        .unwrap_err();

    assert_matches!(err, RegistrarError::CapacityExceeded { .. });
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_started_course_fails(pool: PgPool) {
    let course = common::create_course_starting_in(&pool, "a4", 5, -1).await;
    let (_, pre) = common::add_pending_participant(&pool, "a4", &course).await;

    let err = PreRegistrationRepo::approve(&pool, pre.id, None)
        .await
        .unwrap_err();

    assert_matches!(err, RegistrarError::CourseAlreadyStarted { .. });
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_unknown_id_not_found(pool: PgPool) {
    let err = PreRegistrationRepo::approve(&pool, 9999, None).await.unwrap_err();
    assert_matches!(err, RegistrarError::NotFound { entity: "pre-registration", .. });
}

// ---------------------------------------------------------------------------
// Reject
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reject_records_reason(pool: PgPool) {
    let (_, _, pre) = common::pending_pre_registration(&pool, "r1", 5).await;

    let rejected = PreRegistrationRepo::reject(&pool, pre.id, "missing prerequisites")
        .await
        .unwrap();

    assert_eq!(rejected.status_id, PreRegistrationStatus::Rejected.id());
    assert_eq!(rejected.notes.as_deref(), Some("missing prerequisites"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reject_requires_reason(pool: PgPool) {
    let (_, _, pre) = common::pending_pre_registration(&pool, "r2", 5).await;

    let err = PreRegistrationRepo::reject(&pool, pre.id, "   ").await.unwrap_err();

    assert_matches!(err, RegistrarError::Validation(_));
}

/// Rejecting twice: first call succeeds, second fails and leaves the row
/// unchanged.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reject_twice_second_fails_state_unchanged(pool: PgPool) {
    let (_, _, pre) = common::pending_pre_registration(&pool, "r3", 5).await;

    PreRegistrationRepo::reject(&pool, pre.id, "first reason").await.unwrap();
    let err = PreRegistrationRepo::reject(&pool, pre.id, "second reason")
        .await
        .unwrap_err();
    assert_matches!(err, RegistrarError::InvalidTransition { current: "rejected", .. });

    let row = PreRegistrationRepo::find_by_id(&pool, pre.id).await.unwrap().unwrap();
    assert_eq!(row.status_id, PreRegistrationStatus::Rejected.id());
    assert_eq!(row.notes.as_deref(), Some("first reason"));
}

// ---------------------------------------------------------------------------
// Revert to pending
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revert_approved_succeeds(pool: PgPool) {
    let (_, _, pre) = common::pending_pre_registration(&pool, "v1", 5).await;
    PreRegistrationRepo::approve(&pool, pre.id, None).await.unwrap();

    let reverted = PreRegistrationRepo::revert_to_pending(&pool, pre.id).await.unwrap();

    assert_eq!(reverted.status_id, PreRegistrationStatus::Pending.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revert_pending_fails(pool: PgPool) {
    let (_, _, pre) = common::pending_pre_registration(&pool, "v2", 5).await;

    let err = PreRegistrationRepo::revert_to_pending(&pool, pre.id).await.unwrap_err();

    assert_matches!(err, RegistrarError::InvalidTransition { current: "pending", .. });
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revert_rejected_fails(pool: PgPool) {
    let (_, _, pre) = common::pending_pre_registration(&pool, "v3", 5).await;
    PreRegistrationRepo::reject(&pool, pre.id, "no").await.unwrap();

    let err = PreRegistrationRepo::revert_to_pending(&pool, pre.id).await.unwrap_err();

    assert_matches!(err, RegistrarError::InvalidTransition { current: "rejected", .. });
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revert_with_enrollment_fails(pool: PgPool) {
    let (_, _, pre) = common::pending_pre_registration(&pool, "v4", 5).await;
    common::approve_and_pay(&pool, pre.id, "v4", common::DEFAULT_PRICE_CENTS).await;
    EnrollmentRepo::promote(&pool, pre.id, None).await.unwrap();

    let err = PreRegistrationRepo::revert_to_pending(&pool, pre.id).await.unwrap_err();

    assert_matches!(err, RegistrarError::EnrollmentExists(id) if id == pre.id);
}

/// Reverting an approved, paid pre-registration keeps the payment row.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revert_keeps_payment(pool: PgPool) {
    let (_, _, pre) = common::pending_pre_registration(&pool, "v5", 5).await;
    common::approve_and_pay(&pool, pre.id, "v5", common::DEFAULT_PRICE_CENTS).await;

    PreRegistrationRepo::revert_to_pending(&pool, pre.id).await.unwrap();

    let payment = PaymentRepo::find_by_pre_registration(&pool, pre.id)
        .await
        .unwrap();
    assert!(payment.is_some(), "payment should survive the revert");
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

/// One bad item does not roll back its siblings.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_batch_is_best_effort(pool: PgPool) {
    let course = common::create_course(&pool, "b1", 10).await;
    let (_, first) = common::add_pending_participant(&pool, "b1-a", &course).await;
    let (_, second) = common::add_pending_participant(&pool, "b1-b", &course).await;
    let (_, third) = common::add_pending_participant(&pool, "b1-c", &course).await;
    PreRegistrationRepo::reject(&pool, second.id, "ineligible").await.unwrap();

    let outcome =
        PreRegistrationRepo::approve_batch(&pool, &[first.id, second.id, third.id], None).await;

    assert_eq!(outcome.succeeded, vec![first.id, third.id]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].id, second.id);

    let row = PreRegistrationRepo::find_by_id(&pool, third.id).await.unwrap().unwrap();
    assert_eq!(row.status_id, PreRegistrationStatus::Approved.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reject_batch_requires_reason(pool: PgPool) {
    let (_, _, pre) = common::pending_pre_registration(&pool, "b2", 5).await;

    let err = PreRegistrationRepo::reject_batch(&pool, &[pre.id], "")
        .await
        .unwrap_err();

    assert_matches!(err, RegistrarError::Validation(_));
}

// ---------------------------------------------------------------------------
// Uniqueness
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_pair_rejected(pool: PgPool) {
    let (course, participant, _) = common::pending_pre_registration(&pool, "u1", 5).await;

    let err = PreRegistrationRepo::create(
        &pool,
        &CreatePreRegistration {
            participant_id: participant.id,
            course_id: course.id,
            notes: None,
        },
    )
    .await
    .unwrap_err();

    assert_matches!(
        err,
        RegistrarError::Duplicate { ref constraint }
            if constraint == constraints::PRE_REGISTRATION_PER_PARTICIPANT_COURSE
    );
}
