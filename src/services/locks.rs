use crate::services::error::EventError;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::sleep;
use std::time::Duration;

/// Per-event mutual exclusion for every read-modify-write sequence touching
/// an event's roster or lifecycle fields. User-driven RSVPs wait on the
/// lock; scheduler sweeps use a bounded retry so a wedged event is skipped
/// instead of stalling the whole sweep.
pub struct EventLockService {
    locks: Arc<DashMap<i32, Arc<Mutex<()>>>>,
}

impl EventLockService {
    pub fn new() -> Self {
        let locks: Arc<DashMap<i32, Arc<Mutex<()>>>> = Arc::new(DashMap::new());
        let sweeper = Arc::clone(&locks);

        // Drop idle entries so the table stays proportional to live events.
        // strong_count == 1 means no task holds a clone of the mutex.
        tokio::spawn(async move {
            loop {
                sleep(Duration::from_secs(300)).await;
                sweeper.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
        });

        Self { locks }
    }

    fn entry(&self, event_id: i32) -> Arc<Mutex<()>> {
        self.locks
            .entry(event_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn acquire(&self, event_id: i32) -> OwnedMutexGuard<()> {
        self.entry(event_id).lock_owned().await
    }

    pub async fn try_acquire_with_retry(
        &self,
        event_id: i32,
    ) -> Result<OwnedMutexGuard<()>, EventError> {
        let lock = self.entry(event_id);
        for attempt in 0u32..3 {
            if let Ok(guard) = lock.clone().try_lock_owned() {
                return Ok(guard);
            }
            sleep(Duration::from_millis(50 * (attempt as u64 + 1))).await;
        }
        Err(EventError::ConcurrentModification(event_id))
    }
}
