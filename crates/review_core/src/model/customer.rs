//! Customer records.

use super::{require_text, EntityKind, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-assigned customer identifier.
pub type CustomerId = i64;

/// Draft for a customer that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
}

impl NewCustomer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(EntityKind::Customer, "name", &self.name)
    }
}

/// Persisted customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
}

impl Customer {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(EntityKind::Customer, "name", &self.name)
    }
}
