//! Content store error types.

use curriculum_core::EntityKind;
use thiserror::Error;

use super::EntityKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} does not exist")]
    Missing(EntityKey),

    #[error("{0} already exists")]
    Conflict(EntityKey),

    #[error("required {0} is gone")]
    ParentMissing(EntityKey),

    #[error("{parent} still has {count} {child} row(s)")]
    HasChildren {
        parent: EntityKey,
        child: EntityKind,
        count: usize,
    },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
