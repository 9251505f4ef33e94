//! Database entities module

pub mod charge_point;
pub mod reservation;
pub mod user;

pub use charge_point::Entity as ChargePoint;
pub use reservation::Entity as Reservation;
pub use user::Entity as User;
