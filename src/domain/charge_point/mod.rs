//! Chargepoint aggregate
//!
//! Contains the ChargePoint entity, the connector state machine, and the
//! repository interface.

pub mod model;
pub mod repository;

pub use model::{ChargePoint, Connector, ConnectorState, MAX_CHARGE_POINT_ID_LEN};
pub use repository::ChargePointRepository;
