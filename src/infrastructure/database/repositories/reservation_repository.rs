//! SeaORM implementation of ReservationRepository

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::debug;

use super::{db_err, insert_err};
use crate::domain::reservation::{Reservation, ReservationFilter, ReservationRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::reservation;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn set_flag(&self, id: &str, column: reservation::Column) -> DomainResult<()> {
        let result = reservation::Entity::update_many()
            .col_expr(column, Expr::value(true))
            .filter(reservation::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Reservation", id));
        }
        Ok(())
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn connector_to_db(connector_id: u32) -> DomainResult<i32> {
    i32::try_from(connector_id)
        .map_err(|_| DomainError::Storage(format!("Connector {} out of range", connector_id)))
}

fn model_to_domain(m: reservation::Model) -> DomainResult<Reservation> {
    let connector_id = u32::try_from(m.connector_id).map_err(|_| {
        DomainError::Storage(format!(
            "Reservation '{}' has invalid connector {}",
            m.id, m.connector_id
        ))
    })?;
    Ok(Reservation {
        id: m.id,
        charge_point_id: m.charge_point_id,
        connector_id,
        user_id: m.user_id,
        expiry_time: m.expiry_time,
        charging_time: m.charging_time,
        has_started_charging: m.has_started_charging,
        has_finished_charging: m.has_finished_charging,
        created_at: m.created_at,
    })
}

fn filter_to_condition(f: &ReservationFilter) -> DomainResult<Condition> {
    use reservation::Column;

    let connector = f.connector_id.map(connector_to_db).transpose()?;
    Ok(Condition::all()
        .add_option(f.charge_point_id.as_deref().map(|v| Column::ChargePointId.eq(v)))
        .add_option(connector.map(|v| Column::ConnectorId.eq(v)))
        .add_option(f.user_id.as_deref().map(|v| Column::UserId.eq(v)))
        .add_option(f.has_started_charging.map(|v| Column::HasStartedCharging.eq(v)))
        .add_option(f.has_finished_charging.map(|v| Column::HasFinishedCharging.eq(v)))
        .add_option(f.expiry_at_or_before.map(|t| Column::ExpiryTime.lte(t)))
        .add_option(f.expiry_after.map(|t| Column::ExpiryTime.gt(t)))
        .add_option(f.charging_at_or_before.map(|t| Column::ChargingTime.lte(t))))
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn insert(&self, r: Reservation) -> DomainResult<()> {
        debug!(reservation_id = %r.id, "Saving reservation");

        let model = reservation::ActiveModel {
            id: Set(r.id.clone()),
            charge_point_id: Set(r.charge_point_id),
            connector_id: Set(connector_to_db(r.connector_id)?),
            user_id: Set(r.user_id),
            expiry_time: Set(r.expiry_time),
            charging_time: Set(r.charging_time),
            has_started_charging: Set(r.has_started_charging),
            has_finished_charging: Set(r.has_finished_charging),
            created_at: Set(r.created_at),
        };
        model
            .insert(&self.db)
            .await
            .map_err(|e| insert_err("Reservation", &r.id, e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>> {
        reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_all(&self) -> DomainResult<Vec<Reservation>> {
        self.find_many(&ReservationFilter::default()).await
    }

    async fn find_many(&self, filter: &ReservationFilter) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(filter_to_condition(filter)?)
            .order_by_desc(reservation::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn mark_started(&self, id: &str) -> DomainResult<()> {
        self.set_flag(id, reservation::Column::HasStartedCharging).await
    }

    async fn mark_finished(&self, id: &str) -> DomainResult<()> {
        self.set_flag(id, reservation::Column::HasFinishedCharging).await
    }

    async fn delete_all(&self) -> DomainResult<()> {
        reservation::Entity::delete_many()
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
