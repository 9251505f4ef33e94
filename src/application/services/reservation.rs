//! Reservation lifecycle service
//!
//! Creates reservations, starts charging on them, and carries the operator
//! override for connector state. Each operation holds the chargepoint lock
//! from the connector read until the connector write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::locks::ChargePointLocks;
use crate::domain::{
    ChargePoint, ConnectorState, DomainError, DomainResult, RepositoryProvider, Reservation,
};

pub struct ReservationService {
    repos: Arc<dyn RepositoryProvider>,
    locks: ChargePointLocks,
}

impl ReservationService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, locks: ChargePointLocks) -> Self {
        Self { repos, locks }
    }

    pub async fn create_reservation(
        &self,
        charge_point_id: &str,
        connector: i64,
        user_id: &str,
        duration_minutes: i64,
    ) -> DomainResult<Reservation> {
        self.create_reservation_with(
            charge_point_id,
            connector,
            user_id,
            duration_minutes,
            Utc::now,
        )
        .await
    }

    /// Reserve an Available connector for `user_id`.
    ///
    /// Checks, in order: chargepoint exists, connector in range, connector
    /// Available, user exists, duration within bounds. The reservation is
    /// inserted before the connector list is rewritten; if the rewrite fails
    /// the reservation stays and the error is returned.
    pub async fn create_reservation_at(
        &self,
        charge_point_id: &str,
        connector: i64,
        user_id: &str,
        duration_minutes: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Reservation> {
        self.create_reservation_with(
            charge_point_id,
            connector,
            user_id,
            duration_minutes,
            || now,
        )
        .await
    }

    /// `clock` is read once the chargepoint lock is held.
    async fn create_reservation_with(
        &self,
        charge_point_id: &str,
        connector: i64,
        user_id: &str,
        duration_minutes: i64,
        clock: impl Fn() -> DateTime<Utc>,
    ) -> DomainResult<Reservation> {
        let _guard = self.locks.lock(charge_point_id).await;
        let now = clock();

        let mut charge_point = self.load_charge_point(charge_point_id).await?;
        let index = charge_point.connector_index(connector)?;
        charge_point.reserve_connector(index)?;
        self.ensure_user(user_id).await?;

        let reservation =
            Reservation::schedule(charge_point_id, index, user_id, duration_minutes, now)?;
        self.repos.reservations().insert(reservation.clone()).await?;

        if let Err(e) = self
            .repos
            .charge_points()
            .replace_connectors(charge_point_id, &charge_point.connectors)
            .await
        {
            error!(
                reservation_id = %reservation.id,
                chargepoint_id = %charge_point_id,
                connector = index,
                error = %e,
                "Reservation stored but connector was not reserved; needs manual reconciliation"
            );
            return Err(e);
        }

        info!(
            reservation_id = %reservation.id,
            chargepoint_id = %charge_point_id,
            connector = index,
            user_id = %user_id,
            minutes = duration_minutes,
            "Connector reserved"
        );
        Ok(reservation)
    }

    pub async fn start_charging(
        &self,
        charge_point_id: &str,
        connector: i64,
        user_id: &str,
    ) -> DomainResult<Reservation> {
        self.start_charging_with(charge_point_id, connector, user_id, Utc::now)
            .await
    }

    /// Move a reserved connector to Charging for the reservation holder.
    ///
    /// Requires an open reservation on exactly this chargepoint, connector
    /// and user whose grace window has not lapsed at `now`.
    pub async fn start_charging_at(
        &self,
        charge_point_id: &str,
        connector: i64,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Reservation> {
        self.start_charging_with(charge_point_id, connector, user_id, || now)
            .await
    }

    /// `clock` is read once the chargepoint lock is held, so the grace
    /// window is judged at the moment the connector is written.
    async fn start_charging_with(
        &self,
        charge_point_id: &str,
        connector: i64,
        user_id: &str,
        clock: impl Fn() -> DateTime<Utc>,
    ) -> DomainResult<Reservation> {
        self.ensure_user(user_id).await?;

        let _guard = self.locks.lock(charge_point_id).await;
        let now = clock();
        let mut charge_point = self.load_charge_point(charge_point_id).await?;
        let index = charge_point.connector_index(connector)?;

        let mut reservation = self
            .repos
            .reservations()
            .find_open_for(charge_point_id, index, user_id, now)
            .await?
            .ok_or_else(|| DomainError::NoActiveReservation {
                chargepoint_id: charge_point_id.to_string(),
                connector: index,
                user_id: user_id.to_string(),
            })?;

        charge_point.transition_connector(index, ConnectorState::Charging)?;
        self.repos
            .charge_points()
            .replace_connectors(charge_point_id, &charge_point.connectors)
            .await?;

        if let Err(e) = self.repos.reservations().mark_started(&reservation.id).await {
            error!(
                reservation_id = %reservation.id,
                chargepoint_id = %charge_point_id,
                connector = index,
                error = %e,
                "Connector is charging but reservation was not marked started; needs manual reconciliation"
            );
            return Err(e);
        }
        reservation.has_started_charging = true;

        info!(
            reservation_id = %reservation.id,
            chargepoint_id = %charge_point_id,
            connector = index,
            user_id = %user_id,
            "Charging started"
        );
        Ok(reservation)
    }

    /// Operator override. Sets any known state regardless of the current
    /// one and never touches reservations.
    pub async fn force_connector_state(
        &self,
        charge_point_id: &str,
        connector: i64,
        state: &str,
    ) -> DomainResult<ChargePoint> {
        let _guard = self.locks.lock(charge_point_id).await;

        let mut charge_point = self.load_charge_point(charge_point_id).await?;
        let index = charge_point.connector_index(connector)?;
        let state: ConnectorState = state.parse()?;

        let previous = charge_point.connector_state(index);
        charge_point.force_connector_state(index, state)?;
        self.repos
            .charge_points()
            .replace_connectors(charge_point_id, &charge_point.connectors)
            .await?;

        warn!(
            chargepoint_id = %charge_point_id,
            connector = index,
            from = ?previous,
            to = %state,
            "Connector state overridden"
        );
        Ok(charge_point)
    }

    async fn load_charge_point(&self, id: &str) -> DomainResult<ChargePoint> {
        self.repos
            .charge_points()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Chargepoint", id))
    }

    async fn ensure_user(&self, id: &str) -> DomainResult<()> {
        match self.repos.users().find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found("User", id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::application::services::testing::{assert_consistent, FlakyRepos};
    use crate::application::services::RegistryService;
    use crate::infrastructure::InMemoryRepositoryProvider;

    async fn setup() -> (Arc<dyn RepositoryProvider>, ReservationService) {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        seed(repos.clone()).await;
        let svc = ReservationService::new(repos.clone(), ChargePointLocks::new());
        (repos, svc)
    }

    async fn seed(repos: Arc<dyn RepositoryProvider>) {
        let registry = RegistryService::new(repos);
        registry.register_charge_point("cp1", 2).await.unwrap();
        registry.register_user("u1", "Alice").await.unwrap();
        registry.register_user("u2", "Bob").await.unwrap();
    }

    async fn state_of(repos: &dyn RepositoryProvider, connector: u32) -> ConnectorState {
        repos
            .charge_points()
            .find_by_id("cp1")
            .await
            .unwrap()
            .unwrap()
            .connector_state(connector)
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_chargepoints_leave_no_lock_entries() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        seed(repos.clone()).await;
        let locks = ChargePointLocks::new();
        let svc = ReservationService::new(repos, locks.clone());

        for i in 0..200 {
            let cp = format!("ghost-{i}");
            assert!(svc.force_connector_state(&cp, 1, "Available").await.is_err());
            assert!(svc.create_reservation(&cp, 1, "u1", 45).await.is_err());
            assert!(svc.start_charging(&cp, 1, "u1").await.is_err());
        }
        svc.create_reservation("cp1", 1, "u1", 45).await.unwrap();
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn reserve_then_charge_scenario() {
        let (repos, svc) = setup().await;
        let now = Utc::now();

        let r = svc
            .create_reservation_at("cp1", 1, "u1", 45, now)
            .await
            .unwrap();
        assert_eq!(r.expiry_time, now + Duration::minutes(10));
        assert_eq!(r.charging_time, now + Duration::minutes(45));
        assert_eq!(state_of(repos.as_ref(), 1).await, ConnectorState::Reserved);
        assert_eq!(state_of(repos.as_ref(), 2).await, ConnectorState::Available);
        assert_consistent(repos.as_ref()).await;

        let err = svc.start_charging_at("cp1", 1, "u2", now).await.unwrap_err();
        assert!(matches!(err, DomainError::NoActiveReservation { .. }));
        assert_eq!(state_of(repos.as_ref(), 1).await, ConnectorState::Reserved);
        assert_consistent(repos.as_ref()).await;

        let started = svc.start_charging_at("cp1", 1, "u1", now).await.unwrap();
        assert!(started.has_started_charging);
        assert_eq!(state_of(repos.as_ref(), 1).await, ConnectorState::Charging);
        let stored = repos.reservations().find_by_id(&r.id).await.unwrap().unwrap();
        assert!(stored.has_started_charging);
        assert!(!stored.has_finished_charging);
        assert_consistent(repos.as_ref()).await;
    }

    #[tokio::test]
    async fn create_checks_preconditions_in_order() {
        let (repos, svc) = setup().await;

        // Unknown chargepoint wins over every other problem.
        assert!(matches!(
            svc.create_reservation("nope", 9, "ghost", 5).await,
            Err(DomainError::NotFound { entity: "Chargepoint", .. })
        ));
        for bad in [0, -1, 3] {
            assert!(matches!(
                svc.create_reservation("cp1", bad, "ghost", 5).await,
                Err(DomainError::ConnectorOutOfRange { .. })
            ));
        }
        assert!(matches!(
            svc.create_reservation("cp1", 1, "ghost", 5).await,
            Err(DomainError::NotFound { entity: "User", .. })
        ));
        assert!(matches!(
            svc.create_reservation("cp1", 1, "u1", 29).await,
            Err(DomainError::DurationOutOfBounds { minutes: 29, .. })
        ));
        assert!(matches!(
            svc.create_reservation("cp1", 1, "u1", 181).await,
            Err(DomainError::DurationOutOfBounds { minutes: 181, .. })
        ));

        svc.create_reservation("cp1", 1, "u1", 30).await.unwrap();
        assert!(matches!(
            svc.create_reservation("cp1", 1, "ghost", 5).await,
            Err(DomainError::ConnectorNotAvailable {
                index: 1,
                state: ConnectorState::Reserved
            })
        ));
        svc.create_reservation("cp1", 2, "u2", 180).await.unwrap();

        assert_eq!(repos.reservations().find_all().await.unwrap().len(), 2);
        assert_consistent(repos.as_ref()).await;
    }

    #[tokio::test]
    async fn rejected_create_writes_nothing() {
        let (repos, svc) = setup().await;
        let _ = svc.create_reservation("cp1", 1, "u1", 200).await;
        let _ = svc.create_reservation("cp1", 1, "ghost", 60).await;
        assert!(repos.reservations().find_all().await.unwrap().is_empty());
        assert_eq!(state_of(repos.as_ref(), 1).await, ConnectorState::Available);
    }

    #[tokio::test]
    async fn start_charging_checks_preconditions_in_order() {
        let (repos, svc) = setup().await;
        assert!(matches!(
            svc.start_charging("nope", 9, "ghost").await,
            Err(DomainError::NotFound { entity: "User", .. })
        ));
        assert!(matches!(
            svc.start_charging("nope", 9, "u1").await,
            Err(DomainError::NotFound { entity: "Chargepoint", .. })
        ));
        assert!(matches!(
            svc.start_charging("cp1", 9, "u1").await,
            Err(DomainError::ConnectorOutOfRange { index: 9, count: 2 })
        ));
        assert!(matches!(
            svc.start_charging("cp1", 1, "u1").await,
            Err(DomainError::NoActiveReservation { .. })
        ));
        assert_consistent(repos.as_ref()).await;
    }

    #[tokio::test]
    async fn grace_window_is_not_extendable() {
        let (repos, svc) = setup().await;
        let created = Utc::now() - Duration::minutes(11);
        svc.create_reservation_at("cp1", 1, "u1", 60, created)
            .await
            .unwrap();

        let err = svc.start_charging("cp1", 1, "u1").await.unwrap_err();
        assert!(matches!(err, DomainError::NoActiveReservation { .. }));
        assert_eq!(state_of(repos.as_ref(), 1).await, ConnectorState::Reserved);
    }

    #[tokio::test]
    async fn cannot_start_twice() {
        let (repos, svc) = setup().await;
        svc.create_reservation("cp1", 2, "u1", 60).await.unwrap();
        svc.start_charging("cp1", 2, "u1").await.unwrap();
        assert!(matches!(
            svc.start_charging("cp1", 2, "u1").await,
            Err(DomainError::NoActiveReservation { .. })
        ));
        assert_consistent(repos.as_ref()).await;
    }

    #[tokio::test]
    async fn override_sets_any_state_and_leaves_reservations_alone() {
        let (repos, svc) = setup().await;
        let r = svc.create_reservation("cp1", 1, "u1", 60).await.unwrap();

        let cp = svc
            .force_connector_state("cp1", 2, "Unavailable")
            .await
            .unwrap();
        assert_eq!(cp.connector_state(2), Some(ConnectorState::Unavailable));
        svc.force_connector_state("cp1", 2, "Charging").await.unwrap();
        svc.force_connector_state("cp1", 2, "Available").await.unwrap();
        assert_eq!(state_of(repos.as_ref(), 2).await, ConnectorState::Available);

        svc.force_connector_state("cp1", 1, "Available").await.unwrap();
        let stored = repos.reservations().find_by_id(&r.id).await.unwrap().unwrap();
        assert_eq!(stored, r);

        assert!(matches!(
            svc.force_connector_state("cp1", 1, "available").await,
            Err(DomainError::InvalidConnectorState(_))
        ));
        assert!(matches!(
            svc.force_connector_state("cp1", 3, "Available").await,
            Err(DomainError::ConnectorOutOfRange { .. })
        ));
        assert!(matches!(
            svc.force_connector_state("cp9", 1, "Available").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn partial_write_is_reported_and_not_rolled_back() {
        let flaky = Arc::new(FlakyRepos::new());
        let repos: Arc<dyn RepositoryProvider> = flaky.clone();
        seed(repos.clone()).await;
        let svc = ReservationService::new(repos.clone(), ChargePointLocks::new());

        flaky.fail_connector_writes(true);
        let err = svc.create_reservation("cp1", 1, "u1", 60).await.unwrap_err();
        assert!(err.is_storage());

        assert_eq!(repos.reservations().find_all().await.unwrap().len(), 1);
        assert_eq!(state_of(repos.as_ref(), 1).await, ConnectorState::Available);
    }

    #[tokio::test]
    async fn concurrent_reservations_on_one_connector_admit_one() {
        let (repos, _) = setup().await;
        let svc = Arc::new(ReservationService::new(repos.clone(), ChargePointLocks::new()));

        let attempts: Vec<_> = ["u1", "u2", "u1", "u2"]
            .into_iter()
            .map(|user| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.create_reservation("cp1", 1, user, 60).await })
            })
            .collect();

        let mut won = 0;
        for attempt in attempts {
            if attempt.await.unwrap().is_ok() {
                won += 1;
            }
        }
        assert_eq!(won, 1);
        assert_eq!(repos.reservations().find_all().await.unwrap().len(), 1);
        assert_consistent(repos.as_ref()).await;
    }
}
