//! Reservation DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::Reservation;

/// Reservation API representation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDto {
    pub id: String,
    pub charge_point_id: String,
    pub connector_id: u32,
    pub user_id: String,
    /// Deadline to start charging
    pub expiry_time: DateTime<Utc>,
    /// Deadline by which charging is finished
    pub charging_time: DateTime<Utc>,
    pub has_started_charging: bool,
    pub has_finished_charging: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            charge_point_id: r.charge_point_id,
            connector_id: r.connector_id,
            user_id: r.user_id,
            expiry_time: r.expiry_time,
            charging_time: r.charging_time,
            has_started_charging: r.has_started_charging,
            has_finished_charging: r.has_finished_charging,
            created_at: r.created_at,
        }
    }
}

/// Reserve a connector
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub user_id: String,
    /// Charging duration in minutes, 30 to 180 inclusive
    pub minutes: i64,
}

/// Start charging on a reserved connector
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartChargingRequest {
    pub user_id: String,
}
