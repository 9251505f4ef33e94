//! Per-chargepoint serialization of connector list rewrites

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = DashMap<String, Arc<Mutex<()>>>;

/// Hands out one async mutex per chargepoint key.
///
/// Every read-modify-write of a connector list (reserve, start charging,
/// operator override, sweep release) holds the guard from the read until
/// the write has landed. Clones share the same table. An entry lives only
/// while someone holds or waits for its mutex.
#[derive(Clone, Default)]
pub struct ChargePointLocks {
    inner: Arc<LockTable>,
}

impl ChargePointLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, charge_point_id: &str) -> ChargePointGuard {
        // The clone happens under the shard lock, so eviction cannot race it.
        let mutex = self
            .inner
            .entry(charge_point_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        ChargePointGuard {
            guard: Some(guard),
            key: charge_point_id.to_string(),
            table: Arc::clone(&self.inner),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }
}

/// Exclusive access to one chargepoint's connector list.
pub struct ChargePointGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    table: Arc<LockTable>,
}

impl Drop for ChargePointGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the table's own reference left: nobody holds or waits.
        self.table
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
