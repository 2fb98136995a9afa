//! Certificate eligibility rules and verification-code generation.
//!
//! Eligibility is a pure decision over a caller-loaded view of the
//! enrollment; the persistence layer builds the view from the row and the
//! certificate lookup, then enforces the verdict inside its transaction.

use rand::Rng;

use crate::grading::Grade;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum final grade for an honor mention.
pub const HONOR_MENTION_MIN_GRADE: Grade = 90;

/// Fixed prefix of every verification code.
pub const CODE_PREFIX: &str = "CERT";

/// Length of the random code suffix (uppercase alphanumeric characters).
pub const CODE_SUFFIX_LENGTH: usize = 8;

// ---------------------------------------------------------------------------
// Certificate kinds
// ---------------------------------------------------------------------------

/// The certificate types a training center issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateKind {
    /// Attendance only; does not attest passing.
    Participation,
    /// Course passed.
    Approval,
    /// Course passed with distinction.
    HonorMention,
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

/// Minimal view of an enrollment needed for the eligibility decision.
///
/// Loaded from the database by the caller; this module never queries.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityView {
    /// Enrollment is currently in the enrolled (ungraded) state.
    pub is_enrolled: bool,
    /// Enrollment is currently in the approved (passed) state.
    pub is_approved: bool,
    /// Final grade, when one has been recorded.
    pub final_grade: Option<Grade>,
    /// A certificate already exists for this enrollment.
    pub has_certificate: bool,
}

/// Why an enrollment does not qualify for a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Ineligible {
    #[error("enrollment already has a certificate")]
    AlreadyCertified,

    #[error("enrollment status does not qualify for this certificate type")]
    StatusNotQualifying,

    #[error("final grade below the honor-mention threshold")]
    GradeBelowHonorThreshold,
}

/// Decide whether an enrollment qualifies for a certificate of `kind`.
///
/// At most one certificate exists per enrollment regardless of type, so an
/// already-certified enrollment is ineligible for everything.
pub fn check_eligibility(kind: CertificateKind, view: &EligibilityView) -> Result<(), Ineligible> {
    if view.has_certificate {
        return Err(Ineligible::AlreadyCertified);
    }

    match kind {
        CertificateKind::Participation => {
            if view.is_enrolled || view.is_approved {
                Ok(())
            } else {
                Err(Ineligible::StatusNotQualifying)
            }
        }
        CertificateKind::Approval => {
            if view.is_approved {
                Ok(())
            } else {
                Err(Ineligible::StatusNotQualifying)
            }
        }
        CertificateKind::HonorMention => {
            if !view.is_approved {
                return Err(Ineligible::StatusNotQualifying);
            }
            match view.final_grade {
                Some(grade) if grade >= HONOR_MENTION_MIN_GRADE => Ok(()),
                _ => Err(Ineligible::GradeBelowHonorThreshold),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Verification codes
// ---------------------------------------------------------------------------

/// Generate a candidate verification code: `CERT-<year>-<random suffix>`.
///
/// The suffix is uppercase alphanumeric so the code survives being read
/// over the phone or typed from a printed certificate. Global uniqueness is
/// the storage layer's job; callers re-generate on collision.
pub fn generate_verification_code(year: i32) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(CODE_SUFFIX_LENGTH)
        .map(char::from)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    format!("{CODE_PREFIX}-{year}-{suffix}")
}
