use thiserror::Error;

use crate::domain::charge_point::ConnectorState;

/// Coarse classification used by the HTTP layer and the sweep logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Storage,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Chargepoint ID must be between 1 and {max} characters, got {len}")]
    InvalidChargePointId { len: usize, max: usize },

    #[error("Connector quantity must exceed 0, got {0}")]
    InvalidConnectorCount(i64),

    #[error("User ID must be a non-empty string")]
    InvalidUserId,

    #[error("Name must be a non-empty string")]
    InvalidUserName,

    #[error("Connector ID must be between 1 and {count}, got {index}")]
    ConnectorOutOfRange { index: i64, count: usize },

    #[error("Connector {index} must be available (currently {state})")]
    ConnectorNotAvailable { index: u32, state: ConnectorState },

    #[error("Connector {index} cannot move from {from} to {to}")]
    InvalidTransition {
        index: u32,
        from: ConnectorState,
        to: ConnectorState,
    },

    #[error("The reservation time must be between {min} and {max} minutes, got {minutes}")]
    DurationOutOfBounds { minutes: i64, min: i64, max: i64 },

    #[error("User {user_id} does not have an active reservation on {chargepoint_id}/{connector}")]
    NoActiveReservation {
        chargepoint_id: String,
        connector: u32,
        user_id: String,
    },

    #[error("State must be either Available, Unavailable, Charging or Reserved, got '{0}'")]
    InvalidConnectorState(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, value: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            field: "id",
            value: value.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
            _ => ErrorKind::Validation,
        }
    }

    /// Whether the failure came from the store rather than from the request.
    pub fn is_storage(&self) -> bool {
        self.kind() == ErrorKind::Storage
    }
}
