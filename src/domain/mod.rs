//! Core entities, the connector state machine, and repository interfaces.

pub mod charge_point;
pub mod repositories;
pub mod reservation;
pub mod user;

pub use charge_point::{ChargePoint, ChargePointRepository, Connector, ConnectorState};
pub use repositories::{DomainResult, RepositoryProvider};
pub use reservation::{Reservation, ReservationFilter, ReservationRepository};
pub use user::{User, UserRepository};

pub use crate::shared::errors::{DomainError, ErrorKind};
