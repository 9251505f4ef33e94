//! Reservation aggregate
//!
//! Contains the Reservation entity, its scheduling constants, the query
//! filter, and the repository interface.

pub mod model;
pub mod repository;

pub use model::{
    validate_duration, Reservation, ReservationFilter, ReservationPhase, GRACE_PERIOD_MINUTES,
    MAX_DURATION_MINUTES, MIN_DURATION_MINUTES,
};
pub use repository::ReservationRepository;
