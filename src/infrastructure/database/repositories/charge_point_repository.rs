//! SeaORM implementation of ChargePointRepository

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use super::{db_err, insert_err};
use crate::domain::charge_point::{ChargePoint, ChargePointRepository, Connector};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::charge_point;

pub struct SeaOrmChargePointRepository {
    db: DatabaseConnection,
}

impl SeaOrmChargePointRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn connectors_to_json(connectors: &[Connector]) -> DomainResult<String> {
    serde_json::to_string(connectors)
        .map_err(|e| DomainError::Storage(format!("Failed to encode connectors: {}", e)))
}

fn model_to_domain(m: charge_point::Model) -> DomainResult<ChargePoint> {
    let connectors: Vec<Connector> = serde_json::from_str(&m.connectors).map_err(|e| {
        DomainError::Storage(format!("Corrupt connector list for '{}': {}", m.id, e))
    })?;
    Ok(ChargePoint {
        id: m.id,
        connectors,
        registered_at: m.registered_at,
    })
}

// ── ChargePointRepository impl ──────────────────────────────────

#[async_trait]
impl ChargePointRepository for SeaOrmChargePointRepository {
    async fn insert(&self, cp: ChargePoint) -> DomainResult<()> {
        debug!(chargepoint_id = %cp.id, "Saving chargepoint");

        let model = charge_point::ActiveModel {
            id: Set(cp.id.clone()),
            connectors: Set(connectors_to_json(&cp.connectors)?),
            registered_at: Set(cp.registered_at),
        };
        model
            .insert(&self.db)
            .await
            .map_err(|e| insert_err("Chargepoint", &cp.id, e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ChargePoint>> {
        charge_point::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_all(&self) -> DomainResult<Vec<ChargePoint>> {
        let models = charge_point::Entity::find()
            .order_by_asc(charge_point::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn replace_connectors(&self, id: &str, connectors: &[Connector]) -> DomainResult<()> {
        debug!(chargepoint_id = %id, "Replacing connector list");

        let result = charge_point::Entity::update_many()
            .col_expr(
                charge_point::Column::Connectors,
                Expr::value(connectors_to_json(connectors)?),
            )
            .filter(charge_point::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Chargepoint", id));
        }
        Ok(())
    }

    async fn delete_all(&self) -> DomainResult<()> {
        charge_point::Entity::delete_many()
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
