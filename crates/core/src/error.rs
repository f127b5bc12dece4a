use crate::types::DbId;

/// Application-wide error taxonomy shared by every crate in the workspace.
///
/// Inventory-specific failures have their own type
/// ([`crate::inventory::StockError`]) because they carry the offending
/// stock unit; everything else funnels through these variants.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
