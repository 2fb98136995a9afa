use crate::types::DbId;

/// Errors produced by the pure domain functions in this crate.
///
/// The persistence layer has its own, wider error taxonomy; these variants
/// are converted into it at the crate boundary.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),
}
