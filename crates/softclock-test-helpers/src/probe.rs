//! Invocation counting and deadline polling.
//!
//! Tests against a live dispatch thread cannot assert exact invocation
//! counts at exact instants; they assert that a count crosses a threshold
//! before a deadline, or that it stays put across a window. [`Probe`] is the
//! shared counter and [`wait_until`] the deadline poll.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Granularity of deadline polling.
const POLL_STEP: Duration = Duration::from_millis(1);

/// Poll a predicate until it holds or the deadline passes.
///
/// Returns `true` as soon as the predicate holds; `false` if the deadline
/// expired first.
pub fn wait_until(deadline: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    loop {
        if predicate() {
            return true;
        }
        if start.elapsed() >= deadline {
            return false;
        }
        std::thread::sleep(POLL_STEP);
    }
}

/// Cheaply cloneable invocation counter.
///
/// A probe is shared between a test body and the closure it registers as a
/// handler; the handler calls [`hit`](Self::hit) and the test asserts on the
/// observed count.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    count: Arc<AtomicUsize>,
}

impl Probe {
    /// Create a probe with a zero count.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation.
    pub fn hit(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// The number of invocations recorded so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` invocations were recorded.
    ///
    /// Returns `false` if the deadline expired first.
    #[must_use]
    pub fn wait_for(&self, n: usize, deadline: Duration) -> bool {
        wait_until(deadline, || self.count() >= n)
    }

    /// Assert that the count does not change over the given window.
    ///
    /// Returns `true` when the count stayed put.
    #[must_use]
    pub fn stays_at(&self, expected: usize, window: Duration) -> bool {
        !wait_until(window, || self.count() != expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_counts() {
        let probe = Probe::new();
        assert_eq!(probe.count(), 0);

        probe.hit();
        probe.hit();
        assert_eq!(probe.count(), 2);

        let alias = probe.clone();
        alias.hit();
        assert_eq!(probe.count(), 3);
    }

    #[test]
    fn test_wait_until_immediate() {
        assert!(wait_until(Duration::from_millis(1), || true));
    }

    #[test]
    fn test_wait_until_expires() {
        assert!(!wait_until(Duration::from_millis(5), || false));
    }

    #[test]
    fn test_wait_for_crossing() {
        let probe = Probe::new();
        let worker = {
            let probe = probe.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(5));
                probe.hit();
            })
        };

        assert!(probe.wait_for(1, Duration::from_secs(2)));
        worker.join().unwrap();
    }

    #[test]
    fn test_stays_at() {
        let probe = Probe::new();
        probe.hit();
        assert!(probe.stays_at(1, Duration::from_millis(10)));
        assert!(!probe.stays_at(0, Duration::from_millis(10)));
    }
}
