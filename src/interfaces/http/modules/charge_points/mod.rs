//! Charge Point module: registration, lookup, operator override

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
