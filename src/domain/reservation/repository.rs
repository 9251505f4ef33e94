//! Reservation repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Reservation, ReservationFilter};
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert a new reservation. Fails with `Conflict` on a duplicate ID.
    async fn insert(&self, reservation: Reservation) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>>;

    /// All reservations, newest first.
    async fn find_all(&self) -> DomainResult<Vec<Reservation>>;

    async fn find_many(&self, filter: &ReservationFilter) -> DomainResult<Vec<Reservation>>;

    /// Flip `has_started_charging` to true.
    async fn mark_started(&self, id: &str) -> DomainResult<()>;

    /// Flip `has_finished_charging` to true.
    async fn mark_finished(&self, id: &str) -> DomainResult<()>;

    /// Reset helper for tests and tooling.
    async fn delete_all(&self) -> DomainResult<()>;

    /// Open reservation held by `user_id` on one connector at `now`.
    async fn find_open_for(
        &self,
        charge_point_id: &str,
        connector_id: u32,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<Reservation>> {
        let filter = ReservationFilter::open_for(charge_point_id, connector_id, user_id, now);
        Ok(self.find_many(&filter).await?.into_iter().next())
    }
}
