//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. State-changing methods open one
//! transaction, take their governing row lock first, check every invariant
//! under the lock, and commit or roll back atomically.

pub mod certificate_repo;
pub mod course_repo;
pub mod enrollment_repo;
pub mod participant_repo;
pub mod payment_repo;
pub mod pre_registration_repo;
pub mod price_schedule_repo;
pub mod seat_ledger;

pub use certificate_repo::CertificateRepo;
pub use course_repo::CourseRepo;
pub use enrollment_repo::EnrollmentRepo;
pub use participant_repo::{ParticipantRepo, ParticipantTypeRepo};
pub use payment_repo::PaymentRepo;
pub use pre_registration_repo::PreRegistrationRepo;
pub use price_schedule_repo::PriceScheduleRepo;
pub use seat_ledger::SeatLedger;
