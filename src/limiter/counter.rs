use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::storage::{KeyValueStore, StorageError};

pub const COUNTER_KEY: &str = "apiCallCounter";
pub const COUNTDOWN_KEY: &str = "apiCallCountdown";

/// Call counter and countdown seconds kept in a [`KeyValueStore`].
///
/// Storage failures are fail-open: a read that fails counts as "no calls
/// made" and a failed write is dropped, so the gate never locks the user out
/// because the state file is unreadable. Every failure is logged and flips
/// [`PersistentCounter::is_degraded`].
///
/// Each read-modify-write holds the store lock for its whole duration; the
/// decay timer runs on its own task.
#[derive(Clone)]
pub struct PersistentCounter {
    store: Arc<Mutex<Box<dyn KeyValueStore>>>,
    degraded: Arc<AtomicBool>,
}

impl PersistentCounter {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Arc::new(Mutex::new(Box::new(store))),
            degraded: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn get(&self) -> u32 {
        let store = self.lock();
        self.read(&**store, COUNTER_KEY).unwrap_or(0)
    }

    pub fn increment(&self) -> u32 {
        let mut store = self.lock();
        let next = self
            .read(&**store, COUNTER_KEY)
            .unwrap_or(0)
            .saturating_add(1);
        self.write(&mut **store, COUNTER_KEY, next);
        debug!(count = next, "api call recorded");
        next
    }

    /// One minute elapsed: give back one call.
    pub fn tick(&self) -> u32 {
        let mut store = self.lock();
        let count = self.read(&**store, COUNTER_KEY).unwrap_or(0);
        if count == 0 {
            return 0;
        }
        let next = count - 1;
        self.write(&mut **store, COUNTER_KEY, next);
        debug!(count = next, "api call counter decayed");
        next
    }

    pub fn reset(&self) {
        let mut store = self.lock();
        self.write(&mut **store, COUNTER_KEY, 0);
        if let Err(e) = store.remove(COUNTDOWN_KEY) {
            self.note_failure(&e);
        }
    }

    /// Persisted countdown, `None` when absent or zero.
    pub fn countdown(&self) -> Option<u32> {
        let store = self.lock();
        self.read(&**store, COUNTDOWN_KEY).filter(|s| *s > 0)
    }

    pub fn set_countdown(&self, seconds: u32) {
        let mut store = self.lock();
        self.write(&mut **store, COUNTDOWN_KEY, seconds);
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn KeyValueStore>> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self, store: &dyn KeyValueStore, key: &str) -> Option<u32> {
        match store.get(key) {
            Ok(value) => value.and_then(|v| v.trim().parse::<u32>().ok()),
            Err(e) => {
                self.note_failure(&e);
                None
            }
        }
    }

    fn write(&self, store: &mut dyn KeyValueStore, key: &str, value: u32) {
        if let Err(e) = store.set(key, &value.to_string()) {
            self.note_failure(&e);
        }
    }

    fn note_failure(&self, err: &StorageError) {
        if !self.degraded.swap(true, Ordering::Relaxed) {
            warn!(error = %err, "state storage unavailable, api calls will not be limited");
        } else {
            debug!(error = %err, "state storage still unavailable");
        }
    }
}
