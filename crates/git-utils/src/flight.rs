//! Single-flight coalescing of concurrent computations.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;

/// Coalesces concurrent computations of the same key.
///
/// While one caller is computing the value for a key, later callers for the
/// same key block on that computation and receive its result instead of
/// repeating the work. Once the computation finishes the key is forgotten;
/// callers are expected to keep their own cache of finished values.
///
/// A failed computation is not shared: waiters retry it themselves.
pub struct SingleFlight<K, V> {
    inflight: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `compute` for `key`, or wait for an identical run already in progress.
    pub fn run<E>(&self, key: &K, compute: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        let cell = {
            let mut map = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(map.entry(key.clone()).or_default())
        };

        let result = cell.get_or_try_init(compute).cloned();

        let mut map = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if map.get(key).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
            map.remove(key);
        }
        result
    }

    /// Number of keys currently being computed.
    pub fn in_flight(&self) -> usize {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<K, V> std::fmt::Debug for SingleFlight<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self
            .inflight
            .lock()
            .map(|m| m.len())
            .unwrap_or_default();
        f.debug_struct("SingleFlight").field("in_flight", &pending).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    #[test]
    fn returns_computed_value() {
        let flight: SingleFlight<u32, String> = SingleFlight::new();
        let v: Result<_, ()> = flight.run(&1, || Ok("one".to_string()));
        assert_eq!(v.unwrap(), "one");
        assert_eq!(flight.in_flight(), 0);
    }

    #[test]
    fn errors_are_not_cached() {
        let flight: SingleFlight<u32, u32> = SingleFlight::new();
        assert!(flight.run(&1, || Err("boom")).is_err());
        assert_eq!(flight.run(&1, || Ok::<_, &str>(7)).unwrap(), 7);
    }

    #[test]
    fn concurrent_callers_share_one_computation() {
        let flight: Arc<SingleFlight<&'static str, usize>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let flight = Arc::clone(&flight);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    flight
                        .run(&"key", || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(50));
                            Ok::<_, ()>(42)
                        })
                        .unwrap()
                })
            })
            .collect();

        for h in handles {
            assert_eq!(h.join().unwrap(), 42);
        }
        // Late arrivals after the first run finished may recompute; the
        // sleep keeps all eight inside one window in practice.
        assert!(calls.load(Ordering::SeqCst) <= 2);
        assert_eq!(flight.in_flight(), 0);
    }
}
