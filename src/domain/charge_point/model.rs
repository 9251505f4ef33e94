//! Chargepoint domain entity and the connector state machine

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::errors::DomainError;

/// Longest accepted chargepoint key.
pub const MAX_CHARGE_POINT_ID_LEN: usize = 20;

/// Lifecycle state of a single connector slot.
///
/// Normal edges: `Available -> Reserved -> Charging -> Available`, plus
/// `Reserved -> Available` when an unstarted reservation lapses.
/// [`ChargePoint::force_connector_state`] bypasses the edges entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConnectorState {
    #[default]
    Available,
    Unavailable,
    Charging,
    Reserved,
}

impl ConnectorState {
    pub const ALL: [ConnectorState; 4] = [
        Self::Available,
        Self::Unavailable,
        Self::Charging,
        Self::Reserved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Unavailable => "Unavailable",
            Self::Charging => "Charging",
            Self::Reserved => "Reserved",
        }
    }

    /// Whether `self -> next` is one of the normal lifecycle edges.
    pub fn can_transition_to(&self, next: ConnectorState) -> bool {
        matches!(
            (self, next),
            (Self::Available, Self::Reserved)
                | (Self::Reserved, Self::Charging)
                | (Self::Reserved, Self::Available)
                | (Self::Charging, Self::Available)
        )
    }
}

impl fmt::Display for ConnectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectorState {
    type Err = DomainError;

    /// Labels are matched exactly; anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| DomainError::InvalidConnectorState(s.to_string()))
    }
}

/// Connector on a chargepoint. `id` is its 1-based position in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    pub id: u32,
    pub state: ConnectorState,
}

impl Connector {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            state: ConnectorState::default(),
        }
    }
}

/// Chargepoint entity
#[derive(Debug, Clone, PartialEq)]
pub struct ChargePoint {
    pub id: String,
    pub connectors: Vec<Connector>,
    pub registered_at: DateTime<Utc>,
}

impl ChargePoint {
    /// Build a chargepoint with `num_connectors` Available connectors
    /// numbered `1..=num_connectors`.
    pub fn new(id: impl Into<String>, num_connectors: i64) -> Result<Self, DomainError> {
        let id = id.into();
        let len = id.chars().count();
        if len == 0 || len > MAX_CHARGE_POINT_ID_LEN {
            return Err(DomainError::InvalidChargePointId {
                len,
                max: MAX_CHARGE_POINT_ID_LEN,
            });
        }
        let count = u32::try_from(num_connectors)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(DomainError::InvalidConnectorCount(num_connectors))?;

        Ok(Self {
            id,
            connectors: (1..=count).map(Connector::new).collect(),
            registered_at: Utc::now(),
        })
    }

    /// Validate a caller-supplied connector index against this chargepoint.
    pub fn connector_index(&self, index: i64) -> Result<u32, DomainError> {
        let out_of_range = || DomainError::ConnectorOutOfRange {
            index,
            count: self.connectors.len(),
        };
        if index < 1 || index > self.connectors.len() as i64 {
            return Err(out_of_range());
        }
        u32::try_from(index).map_err(|_| out_of_range())
    }

    pub fn get_connector(&self, index: u32) -> Option<&Connector> {
        index
            .checked_sub(1)
            .and_then(|pos| self.connectors.get(pos as usize))
    }

    fn connector_mut(&mut self, index: u32) -> Result<&mut Connector, DomainError> {
        let count = self.connectors.len();
        index
            .checked_sub(1)
            .and_then(|pos| self.connectors.get_mut(pos as usize))
            .ok_or(DomainError::ConnectorOutOfRange {
                index: i64::from(index),
                count,
            })
    }

    pub fn connector_state(&self, index: u32) -> Option<ConnectorState> {
        self.get_connector(index).map(|c| c.state)
    }

    /// Move a connector along a normal lifecycle edge.
    pub fn transition_connector(
        &mut self,
        index: u32,
        next: ConnectorState,
    ) -> Result<(), DomainError> {
        let connector = self.connector_mut(index)?;
        if !connector.state.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                index,
                from: connector.state,
                to: next,
            });
        }
        connector.state = next;
        Ok(())
    }

    /// Available -> Reserved.
    pub fn reserve_connector(&mut self, index: u32) -> Result<(), DomainError> {
        let connector = self.connector_mut(index)?;
        if connector.state != ConnectorState::Available {
            return Err(DomainError::ConnectorNotAvailable {
                index,
                state: connector.state,
            });
        }
        connector.state = ConnectorState::Reserved;
        Ok(())
    }

    /// Operator override: set any state regardless of the current one.
    pub fn force_connector_state(
        &mut self,
        index: u32,
        state: ConnectorState,
    ) -> Result<(), DomainError> {
        self.connector_mut(index)?.state = state;
        Ok(())
    }
}
