//! Payment entity and capture DTOs.

use capacita_core::pricing::Discrepancy;
use capacita_core::types::{Cents, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `payments` table. Exactly one per pre-registration.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub pre_registration_id: DbId,
    pub amount_cents: Cents,
    pub receipt_number: String,
    pub paid_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for capturing a payment against an approved pre-registration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordPayment {
    pub pre_registration_id: DbId,
    #[validate(range(min = 1))]
    pub amount_cents: Cents,
    #[validate(length(min = 1, max = 64))]
    pub receipt_number: String,
    pub paid_at: Timestamp,
}

/// DTO for correcting a payment. Only non-`None` fields are applied.
/// Refused entirely once an enrollment exists for the pre-registration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EditPayment {
    #[validate(range(min = 1))]
    pub amount_cents: Option<Cents>,
    #[validate(length(min = 1, max = 64))]
    pub receipt_number: Option<String>,
    pub paid_at: Option<Timestamp>,
}

/// Successful capture result: the stored row plus the price mismatch, if
/// the paid amount deviated from the catalog price. A discrepancy never
/// blocks the write; it is information for the caller.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRecorded {
    pub payment: Payment,
    pub discrepancy: Option<Discrepancy>,
}
