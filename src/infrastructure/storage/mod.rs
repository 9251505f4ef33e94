//! In-memory repository implementations

mod memory;

pub use memory::{
    InMemoryChargePointRepository, InMemoryRepositoryProvider, InMemoryReservationRepository,
    InMemoryUserRepository,
};
