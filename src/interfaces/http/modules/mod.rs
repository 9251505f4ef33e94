pub mod charge_points;
pub mod health;
pub mod reservations;
pub mod users;
