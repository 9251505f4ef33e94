//! Chargepoint repository interface

use async_trait::async_trait;

use super::model::{ChargePoint, Connector};
use crate::domain::DomainResult;

#[async_trait]
pub trait ChargePointRepository: Send + Sync {
    /// Insert a new chargepoint. Fails with `Conflict` if the key exists.
    async fn insert(&self, charge_point: ChargePoint) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ChargePoint>>;

    async fn find_all(&self) -> DomainResult<Vec<ChargePoint>>;

    /// Overwrite the whole connector list of one chargepoint.
    async fn replace_connectors(&self, id: &str, connectors: &[Connector]) -> DomainResult<()>;

    /// Reset helper for tests and tooling.
    async fn delete_all(&self) -> DomainResult<()>;
}
