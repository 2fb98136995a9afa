//! Participant and participant-type entities.

use capacita_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `participant_types` table. Reference data; the type
/// drives pricing via the price schedule.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParticipantType {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `participants` table.
///
/// Immutable in practice once a pre-registration references it; this core
/// offers no update path.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Participant {
    pub id: DbId,
    pub full_name: String,
    pub document_number: String,
    pub participant_type_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a new participant.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateParticipant {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(length(min = 1, max = 32))]
    pub document_number: String,
    pub participant_type_id: DbId,
}
