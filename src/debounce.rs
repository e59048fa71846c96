//! Debounced-commit scheduler.
//!
//! Coalesces a burst of calls under one key into a single callback run after
//! a quiet period. Scheduling under a key that already has a pending timer
//! cancels that timer outright; the superseded callback never runs, not even
//! partially. Independent keys do not interact.
//!
//! Timers run on the ambient tokio runtime, so `schedule` must be called
//! from within one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

type Callback = Box<dyn FnOnce() + Send + 'static>;

struct Pending {
    generation: u64,
    callback: Option<Callback>,
    timer: JoinHandle<()>,
}

/// Keyed debounce scheduler.
///
/// Clones share the same pending-timer table.
#[derive(Clone, Default)]
pub struct Debouncer {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    next_generation: u64,
    pending: HashMap<String, Pending>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `callback` to run after `delay`, replacing any callback
    /// still pending under `key`.
    pub fn schedule(
        &self,
        key: impl Into<String>,
        delay: Duration,
        callback: impl FnOnce() + Send + 'static,
    ) {
        let key = key.into();
        let mut inner = lock(&self.inner);
        inner.next_generation += 1;
        let generation = inner.next_generation;

        if let Some(previous) = inner.pending.remove(&key) {
            previous.timer.abort();
        }

        let timer = tokio::spawn({
            let shared = Arc::clone(&self.inner);
            let key = key.clone();
            async move {
                tokio::time::sleep(delay).await;
                // Only fire if this timer still owns the key; a replacement
                // or a flush may have claimed the callback already.
                let callback = {
                    let mut inner = lock(&shared);
                    match inner.pending.get(&key) {
                        Some(entry) if entry.generation == generation => {
                            inner.pending.remove(&key).and_then(|entry| entry.callback)
                        }
                        _ => None,
                    }
                };
                if let Some(callback) = callback {
                    callback();
                }
            }
        });

        inner.pending.insert(
            key,
            Pending {
                generation,
                callback: Some(Box::new(callback)),
                timer,
            },
        );
    }

    /// Run the callback pending under `key` right away, if any.
    pub fn flush(&self, key: &str) {
        let entry = lock(&self.inner).pending.remove(key);
        if let Some(entry) = entry {
            entry.timer.abort();
            if let Some(callback) = entry.callback {
                callback();
            }
        }
    }

    /// Run every pending callback right away, in an unspecified order.
    pub fn flush_all(&self) {
        let drained: Vec<Pending> = {
            let mut inner = lock(&self.inner);
            inner.pending.drain().map(|(_, entry)| entry).collect()
        };
        for entry in drained {
            entry.timer.abort();
            if let Some(callback) = entry.callback {
                callback();
            }
        }
    }

    /// Whether a callback is pending under `key`.
    pub fn is_pending(&self, key: &str) -> bool {
        lock(&self.inner).pending.contains_key(key)
    }
}

fn lock(mutex: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
