//! Repositories for the `participants` and `participant_types` tables.

use capacita_core::types::DbId;
use sqlx::PgPool;
use validator::Validate;

use crate::error::RegistrarError;
use crate::models::participant::{CreateParticipant, Participant, ParticipantType};

/// Column list for `participants` queries.
const PARTICIPANT_COLUMNS: &str =
    "id, full_name, document_number, participant_type_id, created_at, updated_at";

/// Column list for `participant_types` queries.
const TYPE_COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Provides operations for participants.
pub struct ParticipantRepo;

impl ParticipantRepo {
    /// Register a new participant.
    pub async fn create(
        pool: &PgPool,
        input: &CreateParticipant,
    ) -> Result<Participant, RegistrarError> {
        input.validate()?;

        let query = format!(
            "INSERT INTO participants (full_name, document_number, participant_type_id) \
             VALUES ($1, $2, $3) \
             RETURNING {PARTICIPANT_COLUMNS}"
        );
        let participant = sqlx::query_as::<_, Participant>(&query)
            .bind(&input.full_name)
            .bind(&input.document_number)
            .bind(input.participant_type_id)
            .fetch_one(pool)
            .await?;
        Ok(participant)
    }

    /// Find a participant by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Participant>, RegistrarError> {
        let query = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1");
        let participant = sqlx::query_as::<_, Participant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(participant)
    }
}

/// Provides operations for participant types (pricing reference data).
pub struct ParticipantTypeRepo;

impl ParticipantTypeRepo {
    /// Insert a new participant type.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        description: Option<&str>,
    ) -> Result<ParticipantType, RegistrarError> {
        if name.trim().is_empty() {
            return Err(RegistrarError::Validation(
                "participant type name must not be empty".into(),
            ));
        }

        let query = format!(
            "INSERT INTO participant_types (name, description) \
             VALUES ($1, $2) \
             RETURNING {TYPE_COLUMNS}"
        );
        let ty = sqlx::query_as::<_, ParticipantType>(&query)
            .bind(name)
            .bind(description)
            .fetch_one(pool)
            .await?;
        Ok(ty)
    }

    /// List all participant types, ordered by name.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<ParticipantType>, RegistrarError> {
        let query = format!("SELECT {TYPE_COLUMNS} FROM participant_types ORDER BY name ASC");
        let types = sqlx::query_as::<_, ParticipantType>(&query)
            .fetch_all(pool)
            .await?;
        Ok(types)
    }
}
