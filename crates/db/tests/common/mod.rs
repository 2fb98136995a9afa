//! Shared fixtures for the integration suites.
//!
//! Helpers namespace names, document numbers, and receipts with a caller
//! `tag` so a single test can hold several participants and courses without
//! tripping the uniqueness constraints.
#![allow(dead_code)]

use chrono::{Duration, Utc};
use sqlx::PgPool;

use capacita_core::types::{Cents, DbId};
use capacita_db::models::course::{Course, CreateCourse};
use capacita_db::models::enrollment::Enrollment;
use capacita_db::models::participant::{CreateParticipant, Participant};
use capacita_db::models::payment::{PaymentRecorded, RecordPayment};
use capacita_db::models::pre_registration::{CreatePreRegistration, PreRegistration};
use capacita_db::models::price_schedule::SetPrice;
use capacita_db::repositories::{
    CourseRepo, EnrollmentRepo, ParticipantRepo, ParticipantTypeRepo, PaymentRepo,
    PreRegistrationRepo, PriceScheduleRepo,
};

/// Catalog price used by the fixtures unless a test overrides it.
pub const DEFAULT_PRICE_CENTS: Cents = 12_000;

/// Create a course starting 30 days from now.
pub async fn create_course(pool: &PgPool, tag: &str, capacity: i32) -> Course {
    create_course_starting_in(pool, tag, capacity, 30).await
}

/// Create a course with an explicit offset (negative = already started).
pub async fn create_course_starting_in(
    pool: &PgPool,
    tag: &str,
    capacity: i32,
    days_from_now: i64,
) -> Course {
    let start = Utc::now().date_naive() + Duration::days(days_from_now);
    CourseRepo::create(
        pool,
        &CreateCourse {
            name: format!("Course {tag}"),
            capacity_total: capacity,
            start_date: start,
            end_date: start + Duration::days(30),
        },
    )
    .await
    .unwrap()
}

/// Create a participant with its own participant type.
pub async fn create_participant(pool: &PgPool, tag: &str) -> Participant {
    let ty = ParticipantTypeRepo::create(pool, &format!("type-{tag}"), None)
        .await
        .unwrap();
    ParticipantRepo::create(
        pool,
        &CreateParticipant {
            full_name: format!("Participant {tag}"),
            document_number: format!("DOC-{tag}"),
            participant_type_id: ty.id,
        },
    )
    .await
    .unwrap()
}

/// Set the catalog price for a (course, participant type) pair.
pub async fn set_price(pool: &PgPool, course_id: DbId, participant_type_id: DbId, cents: Cents) {
    PriceScheduleRepo::set_price(
        pool,
        &SetPrice {
            course_id,
            participant_type_id,
            amount_cents: cents,
        },
    )
    .await
    .unwrap();
}

/// Course + participant + priced, pending pre-registration.
pub async fn pending_pre_registration(
    pool: &PgPool,
    tag: &str,
    capacity: i32,
) -> (Course, Participant, PreRegistration) {
    let course = create_course(pool, tag, capacity).await;
    let (participant, pre) = add_pending_participant(pool, tag, &course).await;
    (course, participant, pre)
}

/// Add another priced, pending pre-registration to an existing course.
pub async fn add_pending_participant(
    pool: &PgPool,
    tag: &str,
    course: &Course,
) -> (Participant, PreRegistration) {
    let participant = create_participant(pool, tag).await;
    set_price(
        pool,
        course.id,
        participant.participant_type_id,
        DEFAULT_PRICE_CENTS,
    )
    .await;
    let pre = PreRegistrationRepo::create(
        pool,
        &CreatePreRegistration {
            participant_id: participant.id,
            course_id: course.id,
            notes: None,
        },
    )
    .await
    .unwrap();
    (participant, pre)
}

/// Approve a pre-registration and record a payment of `amount_cents`
/// against it, with a tag-derived receipt number.
pub async fn approve_and_pay(
    pool: &PgPool,
    pre_registration_id: DbId,
    tag: &str,
    amount_cents: Cents,
) -> PaymentRecorded {
    PreRegistrationRepo::approve(pool, pre_registration_id, None)
        .await
        .unwrap();
    PaymentRepo::record(
        pool,
        &RecordPayment {
            pre_registration_id,
            amount_cents,
            receipt_number: format!("R-{tag}"),
            paid_at: Utc::now(),
        },
    )
    .await
    .unwrap()
}

/// Full chain: pending → approved → paid → promoted enrollment.
pub async fn paid_enrollment(
    pool: &PgPool,
    tag: &str,
    capacity: i32,
) -> (Course, Participant, Enrollment) {
    let (course, participant, pre) = pending_pre_registration(pool, tag, capacity).await;
    approve_and_pay(pool, pre.id, tag, DEFAULT_PRICE_CENTS).await;
    let enrollment = EnrollmentRepo::promote(pool, pre.id, None).await.unwrap();
    (course, participant, enrollment)
}
