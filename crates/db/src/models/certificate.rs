//! Certificate entity.

use capacita_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::status::StatusId;

/// A row from the `certificates` table. At most one per enrollment.
///
/// `verification_code` is generated once at creation, printed on the
/// certificate, and never reassigned.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Certificate {
    pub id: DbId,
    pub enrollment_id: DbId,
    pub certificate_type_id: StatusId,
    pub verification_code: String,
    pub issued_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
