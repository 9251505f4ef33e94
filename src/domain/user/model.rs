//! User domain entity

use chrono::{DateTime, Utc};

use crate::shared::errors::DomainError;

/// A registered driver. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Externally supplied identity key
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let name = name.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidUserId);
        }
        if name.trim().is_empty() {
            return Err(DomainError::InvalidUserName);
        }
        Ok(Self {
            id,
            name,
            created_at: Utc::now(),
        })
    }
}
