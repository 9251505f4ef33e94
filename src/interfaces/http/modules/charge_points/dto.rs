//! Charge Point DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{ChargePoint, Connector};

/// Charge Point API representation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChargePointDto {
    pub id: String,
    pub connectors: Vec<ConnectorDto>,
    pub registered_at: DateTime<Utc>,
}

impl From<ChargePoint> for ChargePointDto {
    fn from(cp: ChargePoint) -> Self {
        Self {
            id: cp.id,
            connectors: cp.connectors.into_iter().map(ConnectorDto::from).collect(),
            registered_at: cp.registered_at,
        }
    }
}

/// Connector slot with its 1-based index
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConnectorDto {
    pub id: u32,
    /// Available, Unavailable, Charging or Reserved
    pub state: String,
}

impl From<Connector> for ConnectorDto {
    fn from(c: Connector) -> Self {
        Self {
            id: c.id,
            state: c.state.to_string(),
        }
    }
}

/// Register chargepoint request. The ID comes from the path.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterChargePointRequest {
    /// Number of connectors, at least 1
    #[validate(range(max = 100, message = "At most 100 connectors per chargepoint"))]
    pub connectors: i64,
}

/// Operator override of one connector's state
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangeStateRequest {
    /// Exactly one of Available, Unavailable, Charging, Reserved
    pub state: String,
}
