//! Application services

mod locks;
mod registry;
mod reservation;
mod reservation_sweep;

#[cfg(test)]
pub(crate) mod testing;

pub use locks::{ChargePointGuard, ChargePointLocks};
pub use registry::RegistryService;
pub use reservation::ReservationService;
pub use reservation_sweep::{ReservationSweep, SweepReport, SWEEP_INTERVAL};
