//! Reservation domain entity

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::charge_point::ConnectorState;
use crate::shared::errors::DomainError;

/// Minutes after creation within which charging must start.
pub const GRACE_PERIOD_MINUTES: i64 = 10;
/// Shortest bookable charging duration, inclusive.
pub const MIN_DURATION_MINUTES: i64 = 30;
/// Longest bookable charging duration, inclusive.
pub const MAX_DURATION_MINUTES: i64 = 180;

/// Where a reservation is in its life: not started, started, finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationPhase {
    Pending,
    Charging,
    Finished,
}

/// A time-bounded claim by a user on one connector.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: String,
    pub charge_point_id: String,
    /// 1-based connector index on the chargepoint
    pub connector_id: u32,
    pub user_id: String,
    /// Deadline to begin charging
    pub expiry_time: DateTime<Utc>,
    /// Deadline by which charging must be finished
    pub charging_time: DateTime<Utc>,
    pub has_started_charging: bool,
    pub has_finished_charging: bool,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Schedule a new reservation starting at `now`.
    pub fn schedule(
        charge_point_id: impl Into<String>,
        connector_id: u32,
        user_id: impl Into<String>,
        duration_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        validate_duration(duration_minutes)?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            charge_point_id: charge_point_id.into(),
            connector_id,
            user_id: user_id.into(),
            expiry_time: now + Duration::minutes(GRACE_PERIOD_MINUTES),
            charging_time: now + Duration::minutes(duration_minutes),
            has_started_charging: false,
            has_finished_charging: false,
            created_at: now,
        })
    }

    pub fn phase(&self) -> ReservationPhase {
        match (self.has_started_charging, self.has_finished_charging) {
            (_, true) => ReservationPhase::Finished,
            (true, false) => ReservationPhase::Charging,
            (false, false) => ReservationPhase::Pending,
        }
    }

    /// Not started, not finished, grace window still running.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.phase() == ReservationPhase::Pending && self.expiry_time > now
    }

    /// Picked up by the unstarted-expired sweep pass.
    pub fn is_lapsed_unstarted(&self, now: DateTime<Utc>) -> bool {
        self.phase() == ReservationPhase::Pending && self.expiry_time <= now
    }

    /// Picked up by the completed-charging sweep pass.
    pub fn is_charging_complete(&self, now: DateTime<Utc>) -> bool {
        self.phase() == ReservationPhase::Charging && self.charging_time <= now
    }

    /// Connector state implied by an unfinished reservation.
    pub fn expected_connector_state(&self) -> Option<ConnectorState> {
        match self.phase() {
            ReservationPhase::Pending => Some(ConnectorState::Reserved),
            ReservationPhase::Charging => Some(ConnectorState::Charging),
            ReservationPhase::Finished => None,
        }
    }
}

pub fn validate_duration(minutes: i64) -> Result<(), DomainError> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(DomainError::DurationOutOfBounds {
            minutes,
            min: MIN_DURATION_MINUTES,
            max: MAX_DURATION_MINUTES,
        });
    }
    Ok(())
}

/// Query predicate for [`ReservationRepository::find_many`].
///
/// Unset fields match everything. Range bounds are inclusive for
/// `*_at_or_before` and exclusive for `expiry_after`.
///
/// [`ReservationRepository::find_many`]: super::ReservationRepository::find_many
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservationFilter {
    pub charge_point_id: Option<String>,
    pub connector_id: Option<u32>,
    pub user_id: Option<String>,
    pub has_started_charging: Option<bool>,
    pub has_finished_charging: Option<bool>,
    pub expiry_at_or_before: Option<DateTime<Utc>>,
    pub expiry_after: Option<DateTime<Utc>>,
    pub charging_at_or_before: Option<DateTime<Utc>>,
}

impl ReservationFilter {
    /// Unstarted, unfinished, grace window lapsed at `now`.
    pub fn lapsed_unstarted(now: DateTime<Utc>) -> Self {
        Self {
            has_started_charging: Some(false),
            has_finished_charging: Some(false),
            expiry_at_or_before: Some(now),
            ..Self::default()
        }
    }

    /// Started, unfinished, charging window elapsed at `now`.
    pub fn charging_complete(now: DateTime<Utc>) -> Self {
        Self {
            has_started_charging: Some(true),
            has_finished_charging: Some(false),
            charging_at_or_before: Some(now),
            ..Self::default()
        }
    }

    /// Open reservation held by `user_id` on one connector.
    pub fn open_for(
        charge_point_id: &str,
        connector_id: u32,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            charge_point_id: Some(charge_point_id.to_string()),
            connector_id: Some(connector_id),
            user_id: Some(user_id.to_string()),
            has_started_charging: Some(false),
            has_finished_charging: Some(false),
            expiry_after: Some(now),
            ..Self::default()
        }
    }

    pub fn matches(&self, r: &Reservation) -> bool {
        self.charge_point_id
            .as_ref()
            .map_or(true, |v| *v == r.charge_point_id)
            && self.connector_id.map_or(true, |v| v == r.connector_id)
            && self.user_id.as_ref().map_or(true, |v| *v == r.user_id)
            && self
                .has_started_charging
                .map_or(true, |v| v == r.has_started_charging)
            && self
                .has_finished_charging
                .map_or(true, |v| v == r.has_finished_charging)
            && self.expiry_at_or_before.map_or(true, |t| r.expiry_time <= t)
            && self.expiry_after.map_or(true, |t| r.expiry_time > t)
            && self.charging_at_or_before.map_or(true, |t| r.charging_time <= t)
    }
}
