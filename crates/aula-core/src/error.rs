//! Domain errors

use aula_shared::RecordId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Record {id} not found in {collection}")]
    RecordNotFound { collection: String, id: RecordId },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn not_found(collection: &str, id: RecordId) -> Self {
        DomainError::RecordNotFound { collection: collection.to_string(), id }
    }
}
