//! Per-key coalescing of concurrent async work.

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Runs at most one computation per key at a time.
///
/// Callers arriving while a computation for the same key is in flight wait
/// for it and receive a clone of its result instead of running their own.
/// Once the computation completes the key is released, so later calls start
/// a new one.
///
/// If the caller driving the computation is cancelled, one of the waiters
/// takes over with its own closure.
pub struct SingleFlight<T> {
    calls: DashMap<String, Arc<OnceCell<T>>>,
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
        }
    }

    /// Runs `work` for `key`, or joins the call already in flight.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let cell = self
            .calls
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let value = cell.get_or_init(work).await.clone();

        self.calls
            .remove_if(key, |_, current| Arc::ptr_eq(current, &cell));

        value
    }

    /// Number of keys with a computation in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.len()
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_calls_share_one_run() {
        let flight = Arc::new(SingleFlight::<u32>::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let flight = flight.clone();
                let runs = runs.clone();
                tokio::spawn(async move {
                    flight
                        .run("SITE123", || async move {
                            runs.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            7
                        })
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 7);
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_sequential_calls_run_again() {
        let flight = SingleFlight::<u32>::new();

        assert_eq!(flight.run("k", || async { 1 }).await, 1);
        assert_eq!(flight.run("k", || async { 2 }).await, 2);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let flight = SingleFlight::<&'static str>::new();

        let (a, b) = tokio::join!(
            flight.run("a", || async { "a" }),
            flight.run("b", || async { "b" })
        );

        assert_eq!((a, b), ("a", "b"));
    }
}
