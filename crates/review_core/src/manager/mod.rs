//! Domain managers: the operations consumed by the CLI and by tests.
//!
//! # Responsibility
//! - Enforce cross-entity existence checks before delegating to handlers.
//! - Translate handler not-found errors into manager errors.
//!
//! # Invariants
//! - Reads never fail because a row is missing; they return `Ok(None)`.
//! - Writes referencing a missing row fail with [`ManagerError::NotFound`].

pub mod customer_manager;
pub mod support_manager;

use crate::handler::RepoError;
use crate::model::EntityKind;

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Error surfaced by manager operations.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    /// Referenced or targeted entity does not exist.
    #[error("{kind} with id {id} not found")]
    NotFound { kind: EntityKind, id: i64 },
    /// Any other handler or store failure, passed through unchanged.
    #[error(transparent)]
    Repo(RepoError),
}

impl ManagerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Repo(RepoError::Cancelled(_)))
    }
}

impl From<RepoError> for ManagerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Repo(other),
        }
    }
}
