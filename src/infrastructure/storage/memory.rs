//! In-memory storage implementation

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::{
    ChargePoint, ChargePointRepository, Connector, DomainError, DomainResult, RepositoryProvider,
    Reservation, ReservationFilter, ReservationRepository, User, UserRepository,
};

/// In-memory users for development and testing
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: DashMap<String, User>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> DomainResult<()> {
        match self.users.entry(user.id.clone()) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "User '{}' already exists",
                user.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    async fn delete_all(&self) -> DomainResult<()> {
        self.users.clear();
        Ok(())
    }
}

/// In-memory chargepoints for development and testing
#[derive(Default)]
pub struct InMemoryChargePointRepository {
    charge_points: DashMap<String, ChargePoint>,
}

#[async_trait]
impl ChargePointRepository for InMemoryChargePointRepository {
    async fn insert(&self, charge_point: ChargePoint) -> DomainResult<()> {
        match self.charge_points.entry(charge_point.id.clone()) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "Chargepoint '{}' already exists",
                charge_point.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(charge_point);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ChargePoint>> {
        Ok(self.charge_points.get(id).map(|cp| cp.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<ChargePoint>> {
        let mut cps: Vec<ChargePoint> = self
            .charge_points
            .iter()
            .map(|e| e.value().clone())
            .collect();
        cps.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(cps)
    }

    async fn replace_connectors(&self, id: &str, connectors: &[Connector]) -> DomainResult<()> {
        let mut cp = self
            .charge_points
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("Chargepoint", id))?;
        cp.connectors = connectors.to_vec();
        Ok(())
    }

    async fn delete_all(&self) -> DomainResult<()> {
        self.charge_points.clear();
        Ok(())
    }
}

/// In-memory reservations for development and testing
#[derive(Default)]
pub struct InMemoryReservationRepository {
    reservations: DashMap<String, Reservation>,
}

impl InMemoryReservationRepository {
    fn update_flags(&self, id: &str, apply: impl FnOnce(&mut Reservation)) -> DomainResult<()> {
        let mut r = self
            .reservations
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("Reservation", id))?;
        apply(&mut r);
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn insert(&self, reservation: Reservation) -> DomainResult<()> {
        match self.reservations.entry(reservation.id.clone()) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "Reservation '{}' already exists",
                reservation.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(reservation);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>> {
        Ok(self.reservations.get(id).map(|r| r.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Reservation>> {
        self.find_many(&ReservationFilter::default()).await
    }

    async fn find_many(&self, filter: &ReservationFilter) -> DomainResult<Vec<Reservation>> {
        let mut found: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn mark_started(&self, id: &str) -> DomainResult<()> {
        self.update_flags(id, |r| r.has_started_charging = true)
    }

    async fn mark_finished(&self, id: &str) -> DomainResult<()> {
        self.update_flags(id, |r| r.has_finished_charging = true)
    }

    async fn delete_all(&self) -> DomainResult<()> {
        self.reservations.clear();
        Ok(())
    }
}

/// Repository provider backed entirely by process memory.
///
/// Used by the test suites and by `--in-memory` runs; nothing survives a
/// restart.
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    users: InMemoryUserRepository,
    charge_points: InMemoryChargePointRepository,
    reservations: InMemoryReservationRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
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

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::domain::ConnectorState;

    #[tokio::test]
    async fn duplicate_keys_conflict() {
        let repos = InMemoryRepositoryProvider::new();
        repos
            .users()
            .insert(User::new("u1", "Alice").unwrap())
            .await
            .unwrap();
        let err = repos
            .users()
            .insert(User::new("u1", "Bob").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let cp = ChargePoint::new("cp1", 1).unwrap();
        repos.charge_points().insert(cp.clone()).await.unwrap();
        assert!(matches!(
            repos.charge_points().insert(cp).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn replace_connectors_overwrites_list() {
        let repos = InMemoryRepositoryProvider::new();
        let mut cp = ChargePoint::new("cp1", 2).unwrap();
        repos.charge_points().insert(cp.clone()).await.unwrap();

        cp.reserve_connector(2).unwrap();
        repos
            .charge_points()
            .replace_connectors("cp1", &cp.connectors)
            .await
            .unwrap();

        let stored = repos.charge_points().find_by_id("cp1").await.unwrap().unwrap();
        assert_eq!(stored.connector_state(2), Some(ConnectorState::Reserved));
        assert!(matches!(
            repos.charge_points().replace_connectors("nope", &[]).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn find_many_applies_filter_and_flags() {
        let repos = InMemoryRepositoryProvider::new();
        let now = Utc::now();
        let fresh = Reservation::schedule("cp1", 1, "u1", 60, now).unwrap();
        let stale =
            Reservation::schedule("cp1", 2, "u1", 60, now - Duration::hours(1)).unwrap();
        repos.reservations().insert(fresh.clone()).await.unwrap();
        repos.reservations().insert(stale.clone()).await.unwrap();

        let lapsed = repos
            .reservations()
            .find_many(&ReservationFilter::lapsed_unstarted(now))
            .await
            .unwrap();
        assert_eq!(lapsed.len(), 1);
        assert_eq!(lapsed[0].id, stale.id);

        let open = repos
            .reservations()
            .find_open_for("cp1", 1, "u1", now)
            .await
            .unwrap();
        assert_eq!(open.map(|r| r.id), Some(fresh.id.clone()));

        repos.reservations().mark_started(&fresh.id).await.unwrap();
        repos.reservations().mark_finished(&stale.id).await.unwrap();
        let all = repos.reservations().find_all().await.unwrap();
        assert_eq!(all[0].id, fresh.id, "newest first");
        assert!(all[0].has_started_charging);
        assert!(all[1].has_finished_charging);

        assert!(repos
            .reservations()
            .find_open_for("cp1", 1, "u1", now)
            .await
            .unwrap()
            .is_none());
    }
}
