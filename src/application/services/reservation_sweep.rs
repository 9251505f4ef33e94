//! Background task that reconciles lapsed reservations.
//!
//! Every tick runs two passes. The unstarted-expired pass finishes
//! reservations whose grace window ran out before charging began and frees
//! their Reserved connector. The completed-charging pass finishes started
//! reservations whose charging window elapsed and frees their Charging
//! connector. Each record is marked finished first and released second; a
//! failure on one record is logged and the batch continues.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::locks::ChargePointLocks;
use crate::domain::{
    ConnectorState, DomainError, DomainResult, RepositoryProvider, Reservation, ReservationFilter,
};
use crate::shared::shutdown::ShutdownSignal;

/// Fixed tick period of the sweep.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Unstarted reservations finished by the expiry pass
    pub expired: usize,
    /// Started reservations finished by the completion pass
    pub completed: usize,
    /// Records skipped because a read or write failed
    pub failed: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy)]
enum Pass {
    UnstartedExpired,
    ChargingComplete,
}

impl Pass {
    fn name(self) -> &'static str {
        match self {
            Self::UnstartedExpired => "unstarted_expired",
            Self::ChargingComplete => "charging_complete",
        }
    }

    fn filter(self, now: DateTime<Utc>) -> ReservationFilter {
        match self {
            Self::UnstartedExpired => ReservationFilter::lapsed_unstarted(now),
            Self::ChargingComplete => ReservationFilter::charging_complete(now),
        }
    }

    /// Whether `r` is still due for this pass at `now`.
    fn is_due(self, r: &Reservation, now: DateTime<Utc>) -> bool {
        match self {
            Self::UnstartedExpired => r.is_lapsed_unstarted(now),
            Self::ChargingComplete => r.is_charging_complete(now),
        }
    }

    /// Connector state a reservation selected by this pass should be holding.
    fn held_state(self) -> ConnectorState {
        match self {
            Self::UnstartedExpired => ConnectorState::Reserved,
            Self::ChargingComplete => ConnectorState::Charging,
        }
    }
}

#[derive(Clone)]
pub struct ReservationSweep {
    repos: Arc<dyn RepositoryProvider>,
    locks: ChargePointLocks,
}

impl ReservationSweep {
    pub fn new(repos: Arc<dyn RepositoryProvider>, locks: ChargePointLocks) -> Self {
        Self { repos, locks }
    }

    /// Spawn the periodic loop. It stops when `shutdown` fires.
    pub fn start(&self, shutdown: ShutdownSignal) -> JoinHandle<()> {
        let sweep = self.clone();

        tokio::spawn(async move {
            info!(
                interval_secs = SWEEP_INTERVAL.as_secs(),
                "Reservation sweep started"
            );

            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        sweep.run_once(Utc::now()).await;
                    }
                    _ = shutdown.notified().wait() => {
                        info!("Reservation sweep shutting down");
                        break;
                    }
                }
            }

            info!("Reservation sweep stopped");
        })
    }

    /// Run both passes once against `now`.
    pub async fn run_once(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        self.run_pass(Pass::UnstartedExpired, now, &mut report).await;
        self.run_pass(Pass::ChargingComplete, now, &mut report).await;

        if report.is_empty() {
            debug!("Reservation sweep found nothing to do");
        } else {
            info!(
                expired = report.expired,
                completed = report.completed,
                failed = report.failed,
                "Reservation sweep finished"
            );
        }
        report
    }

    async fn run_pass(&self, pass: Pass, now: DateTime<Utc>, report: &mut SweepReport) {
        let batch = match self.repos.reservations().find_many(&pass.filter(now)).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(pass = pass.name(), error = %e, "Sweep query failed; pass skipped");
                return;
            }
        };

        for reservation in batch {
            match self.finish(&reservation, pass, now).await {
                Ok(false) => {}
                Ok(true) => match pass {
                    Pass::UnstartedExpired => report.expired += 1,
                    Pass::ChargingComplete => report.completed += 1,
                },
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        pass = pass.name(),
                        reservation_id = %reservation.id,
                        chargepoint_id = %reservation.charge_point_id,
                        connector = reservation.connector_id,
                        error = %e,
                        "Failed to reconcile reservation"
                    );
                }
            }
        }
    }

    /// Finish one record of the batch. Returns `false` when the record
    /// changed since the batch was read and is no longer due.
    async fn finish(
        &self,
        queued: &Reservation,
        pass: Pass,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let _guard = self.locks.lock(&queued.charge_point_id).await;

        // The batch was read without the lock; a start request may have won it.
        let reservation = match self.repos.reservations().find_by_id(&queued.id).await? {
            Some(r) if pass.is_due(&r, now) => r,
            _ => {
                debug!(
                    pass = pass.name(),
                    reservation_id = %queued.id,
                    "Reservation changed since the batch was read; skipped"
                );
                return Ok(false);
            }
        };

        self.repos.reservations().mark_finished(&reservation.id).await?;

        let mut charge_point = self
            .repos
            .charge_points()
            .find_by_id(&reservation.charge_point_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Chargepoint", &reservation.charge_point_id))?;

        let index = reservation.connector_id;
        match charge_point.connector_state(index) {
            Some(state) if state == pass.held_state() => {
                charge_point.transition_connector(index, ConnectorState::Available)?;
                self.repos
                    .charge_points()
                    .replace_connectors(&charge_point.id, &charge_point.connectors)
                    .await?;
                debug!(
                    reservation_id = %reservation.id,
                    chargepoint_id = %charge_point.id,
                    connector = index,
                    "Connector released"
                );
            }
            Some(state) => {
                warn!(
                    reservation_id = %reservation.id,
                    chargepoint_id = %charge_point.id,
                    connector = index,
                    state = %state,
                    "Connector no longer held by reservation; left as is"
                );
            }
            None => {
                return Err(DomainError::ConnectorOutOfRange {
                    index: i64::from(index),
                    count: charge_point.connectors.len(),
                });
            }
        }
        Ok(true)
    }
}
