//! Registration and lookup of users and chargepoints

use std::sync::Arc;

use tracing::info;

use crate::domain::{
    ChargePoint, DomainError, DomainResult, RepositoryProvider, Reservation, User,
};

/// Service for the records the reservation lifecycle depends on
pub struct RegistryService {
    repos: Arc<dyn RepositoryProvider>,
}

impl RegistryService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn register_user(&self, id: &str, name: &str) -> DomainResult<User> {
        let user = User::new(id, name)?;
        self.repos.users().insert(user.clone()).await?;
        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    pub async fn list_users(&self) -> DomainResult<Vec<User>> {
        self.repos.users().find_all().await
    }

    /// Create a chargepoint with `connectors` Available connectors.
    /// Nothing is persisted when validation fails.
    pub async fn register_charge_point(
        &self,
        id: &str,
        connectors: i64,
    ) -> DomainResult<ChargePoint> {
        let charge_point = ChargePoint::new(id, connectors)?;
        self.repos.charge_points().insert(charge_point.clone()).await?;
        info!(
            chargepoint_id = %charge_point.id,
            connectors = charge_point.connectors.len(),
            "Chargepoint registered"
        );
        Ok(charge_point)
    }

    pub async fn get_charge_point(&self, id: &str) -> DomainResult<ChargePoint> {
        self.repos
            .charge_points()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Chargepoint", id))
    }

    pub async fn list_charge_points(&self) -> DomainResult<Vec<ChargePoint>> {
        self.repos.charge_points().find_all().await
    }

    pub async fn list_reservations(&self) -> DomainResult<Vec<Reservation>> {
        self.repos.reservations().find_all().await
    }
}
