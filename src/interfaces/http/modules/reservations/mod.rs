//! Reservations module: reserve, start charging, listing

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
