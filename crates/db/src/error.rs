//! Domain error taxonomy for lifecycle operations.
//!
//! Every business-rule violation is returned as a typed variant; raw
//! database errors never cross the repository boundary. Storage-layer
//! constraint violations that slip past an application check (a race
//! between the check and the write) are classified into the matching
//! domain variant by the `From<sqlx::Error>` impl below.

use capacita_core::types::DbId;

/// Named unique constraints enforced by the schema.
///
/// The application raises `Duplicate` with these same names when its own
/// check-under-lock detects the conflict first, so callers see one tag per
/// rule regardless of which layer caught it.
pub mod constraints {
    /// One pre-registration per (participant, course).
    pub const PRE_REGISTRATION_PER_PARTICIPANT_COURSE: &str =
        "uq_pre_registrations_participant_course";
    /// At most one payment per pre-registration.
    pub const PAYMENT_PER_PRE_REGISTRATION: &str = "uq_payments_pre_registration";
    /// Receipt numbers are globally unique.
    pub const RECEIPT_NUMBER: &str = "uq_payments_receipt_number";
    /// At most one enrollment per pre-registration.
    pub const ENROLLMENT_PER_PRE_REGISTRATION: &str = "uq_enrollments_pre_registration";
    /// One enrollment per (participant, course).
    pub const ENROLLMENT_PER_PARTICIPANT_COURSE: &str = "uq_enrollments_participant_course";
    /// At most one certificate per enrollment.
    pub const CERTIFICATE_PER_ENROLLMENT: &str = "uq_certificates_enrollment";
    /// Verification codes are globally unique.
    pub const VERIFICATION_CODE: &str = "uq_certificates_verification_code";
    /// One active price schedule row per (course, participant type).
    pub const ACTIVE_PRICE_PER_COURSE_TYPE: &str = "uq_price_schedules_course_type_active";
}

/// The `courses` capacity bounds check (`0 <= occupied <= total`).
const CAPACITY_CHECK: &str = "ck_courses_capacity_within_bounds";

/// Error type for all lifecycle and catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistrarError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("cannot {action} {entity} {id}: current status is {current}")]
    InvalidTransition {
        entity: &'static str,
        id: DbId,
        current: &'static str,
        action: &'static str,
    },

    #[error("course has no remaining capacity")]
    CapacityExceeded { course_id: Option<DbId> },

    #[error("course {course_id} has already started")]
    CourseAlreadyStarted { course_id: DbId },

    #[error("pre-registration {0} has no recorded payment")]
    MissingPayment(DbId),

    #[error("an enrollment already exists for pre-registration {0}")]
    EnrollmentExists(DbId),

    #[error("duplicate value violates unique constraint {constraint}")]
    Duplicate { constraint: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("lock wait timed out; the operation can be retried")]
    Contention,

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl RegistrarError {
    /// `Contention` is the only variant callers should retry automatically;
    /// everything else needs caller-level correction.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Contention)
    }
}

impl From<validator::ValidationErrors> for RegistrarError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<capacita_core::error::CoreError> for RegistrarError {
    fn from(err: capacita_core::error::CoreError) -> Self {
        use capacita_core::error::CoreError;
        match err {
            CoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            CoreError::Validation(msg) => Self::Validation(msg),
        }
    }
}

/// Classify a sqlx error into the domain taxonomy.
///
/// - `23505` (unique violation) becomes [`RegistrarError::Duplicate`] keyed
///   by the constraint name.
/// - `23514` (check violation) on the capacity bounds check becomes
///   [`RegistrarError::CapacityExceeded`]; the row id is not recoverable
///   from the driver error.
/// - `55P03` (lock not available / lock-wait timeout) becomes the retryable
///   [`RegistrarError::Contention`].
impl From<sqlx::Error> for RegistrarError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23505") => {
                    let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                    return Self::Duplicate { constraint };
                }
                Some("23514") if db_err.constraint() == Some(CAPACITY_CHECK) => {
                    return Self::CapacityExceeded { course_id: None };
                }
                Some("55P03") => return Self::Contention,
                _ => {}
            }
        }
        tracing::error!(error = %err, "Unclassified database error");
        Self::Database(err)
    }
}
