//! Domain model for customers, their reviews and support comments.
//!
//! # Responsibility
//! - Define the records persisted by handlers and returned by managers.
//! - Own field-level validation that must pass before any SQL is issued.
//!
//! # Invariants
//! - Ids are assigned by the store on insert and never change afterward.
//! - `New*` drafts carry no id; persisted records always do.

pub mod comment;
pub mod customer;
pub mod review;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Entity kinds, used to tag not-found errors with what was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Customer,
    Review,
    Comment,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Customer => "Customer",
            Self::Review => "Review",
            Self::Comment => "Comment",
        };
        f.write_str(name)
    }
}

/// Field-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{entity}.{field} must not be blank")]
    BlankField {
        entity: EntityKind,
        field: &'static str,
    },
}

pub(crate) fn require_text(
    entity: EntityKind,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField { entity, field });
    }
    Ok(())
}
