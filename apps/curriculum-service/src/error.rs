//! Error handling for the curriculum service

use curriculum_core::{IntegrityError, SessionError, ValidationError};
use thiserror::Error;

use crate::db::StoreError;

/// Service error types
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Referential integrity: {0}")]
    ReferentialIntegrity(#[from] IntegrityError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Assessment error: {0}")]
    Session(#[from] SessionError),
}

impl ServiceError {
    /// Wrap a generator failure, keeping the whole context chain.
    pub fn generation(err: anyhow::Error) -> Self {
        ServiceError::Generation(format!("{err:#}"))
    }
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;
