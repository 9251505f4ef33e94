//! Shared fixtures for the service tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{
    ChargePoint, ChargePointRepository, Connector, ConnectorState, DomainError, DomainResult,
    RepositoryProvider, Reservation, ReservationFilter, ReservationRepository, UserRepository,
};
use crate::infrastructure::storage::{
    InMemoryChargePointRepository, InMemoryReservationRepository, InMemoryUserRepository,
};

/// Check that reservations and connector states agree.
///
/// An unfinished reservation must find its connector Reserved (not started)
/// or Charging (started), and every Reserved or Charging connector must be
/// backed by exactly one unfinished reservation.
pub async fn assert_consistent(repos: &dyn RepositoryProvider) {
    let reservations = repos.reservations().find_all().await.unwrap();
    let charge_points = repos.charge_points().find_all().await.unwrap();

    for r in reservations.iter().filter(|r| !r.has_finished_charging) {
        let cp = charge_points
            .iter()
            .find(|cp| cp.id == r.charge_point_id)
            .unwrap_or_else(|| panic!("reservation {} points at a missing chargepoint", r.id));
        assert_eq!(
            cp.connector_state(r.connector_id),
            r.expected_connector_state(),
            "reservation {} on {}/{}",
            r.id,
            r.charge_point_id,
            r.connector_id
        );
    }

    for cp in &charge_points {
        for connector in &cp.connectors {
            let holders = reservations
                .iter()
                .filter(|r| {
                    !r.has_finished_charging
                        && r.charge_point_id == cp.id
                        && r.connector_id == connector.id
                })
                .count();
            match connector.state {
                ConnectorState::Reserved | ConnectorState::Charging => assert_eq!(
                    holders, 1,
                    "{}/{} is {} with {} open reservations",
                    cp.id, connector.id, connector.state, holders
                ),
                _ => assert_eq!(
                    holders, 0,
                    "{}/{} is {} but still held",
                    cp.id, connector.id, connector.state
                ),
            }
        }
    }
}

/// In-memory store whose writes can be made to fail on demand.
#[derive(Default)]
pub struct FlakyRepos {
    users: InMemoryUserRepository,
    charge_points: FlakyChargePoints,
    reservations: FlakyReservations,
}

impl FlakyRepos {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `replace_connectors` call fails while set.
    pub fn fail_connector_writes(&self, fail: bool) {
        self.charge_points.fail_replace.store(fail, Ordering::SeqCst);
    }

    /// `mark_finished` fails for this reservation ID.
    pub fn fail_finish_for(&self, reservation_id: &str) {
        self.reservations
            .fail_finish
            .lock()
            .unwrap()
            .insert(reservation_id.to_string());
    }

    /// Every `find_many` call fails while set.
    pub fn fail_queries(&self, fail: bool) {
        self.reservations.fail_query.store(fail, Ordering::SeqCst);
    }
}

impl RepositoryProvider for FlakyRepos {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn charge_points(&self) -> &dyn ChargePointRepository {
        &self.charge_points
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }
}

fn injected() -> DomainError {
    DomainError::Storage("injected failure".to_string())
}

#[derive(Default)]
struct FlakyChargePoints {
    inner: InMemoryChargePointRepository,
    fail_replace: AtomicBool,
}

#[async_trait]
impl ChargePointRepository for FlakyChargePoints {
    async fn insert(&self, charge_point: ChargePoint) -> DomainResult<()> {
        self.inner.insert(charge_point).await
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ChargePoint>> {
        self.inner.find_by_id(id).await
    }

    async fn find_all(&self) -> DomainResult<Vec<ChargePoint>> {
        self.inner.find_all().await
    }

    async fn replace_connectors(&self, id: &str, connectors: &[Connector]) -> DomainResult<()> {
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.replace_connectors(id, connectors).await
    }

    async fn delete_all(&self) -> DomainResult<()> {
        self.inner.delete_all().await
    }
}

#[derive(Default)]
struct FlakyReservations {
    inner: InMemoryReservationRepository,
    fail_finish: Mutex<HashSet<String>>,
    fail_query: AtomicBool,
}

#[async_trait]
impl ReservationRepository for FlakyReservations {
    async fn insert(&self, reservation: Reservation) -> DomainResult<()> {
        self.inner.insert(reservation).await
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>> {
        self.inner.find_by_id(id).await
    }

    async fn find_all(&self) -> DomainResult<Vec<Reservation>> {
        self.inner.find_all().await
    }

    async fn find_many(&self, filter: &ReservationFilter) -> DomainResult<Vec<Reservation>> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.find_many(filter).await
    }

    async fn mark_started(&self, id: &str) -> DomainResult<()> {
        self.inner.mark_started(id).await
    }

    async fn mark_finished(&self, id: &str) -> DomainResult<()> {
        if self.fail_finish.lock().unwrap().contains(id) {
            return Err(injected());
        }
        self.inner.mark_finished(id).await
    }

    async fn delete_all(&self) -> DomainResult<()> {
        self.inner.delete_all().await
    }
}
