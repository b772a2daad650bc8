//! The clock manager and its dispatch loop.
//!
//! One dedicated thread samples elapsed wall-clock time, converts it to
//! logical ticks, and invokes every registered handler once per tick. Ticks
//! are derived from measured elapsed time rather than per-iteration
//! assumptions, so sleep jitter or slow scheduling cannot lose ticks: owed
//! ticks accumulate and are caught up on the next pass, bounding worst-case
//! handler latency to roughly the poll granularity.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::ClockConfig;
use crate::error::ClockResult;
use crate::gate::SuspendGate;
use crate::pending::RemovalQueue;
use crate::registry::TickHandler;

#[cfg(unix)]
use crate::unix::mask_async_signals;

#[cfg(not(unix))]
use crate::fallback::mask_async_signals;

/// State shared between the manager handle and the dispatch thread.
struct Shared {
    gate: SuspendGate,
    removals: Mutex<RemovalQueue>,
    stop: AtomicBool,
    ticks: AtomicU64,
    config: ClockConfig,
}

/// Emulated interrupt clock.
///
/// Starts one background dispatch thread at construction and joins it at
/// [`shutdown`](Self::shutdown) (also run on drop). All methods are callable
/// from any thread.
///
/// # Reentrancy
///
/// From inside a running handler, [`unregister`](Self::unregister) is safe:
/// it detects the in-flight batch and defers the removal instead of
/// deadlocking. [`is_suspended`](Self::is_suspended) and
/// [`ticks_dispatched`](Self::ticks_dispatched) are lock-free reads and are
/// also safe. Every other method takes the gate lock the dispatch thread
/// holds for the whole batch, so calling `register`, `suspend`, `resume`,
/// `handler_count`, or `shutdown` from a handler deadlocks against the
/// dispatch thread.
pub struct SoftClock {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SoftClock {
    /// Start the clock with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`](crate::error::ClockError) for an
    /// out-of-range configuration and
    /// [`ClockError::ThreadSpawn`](crate::error::ClockError) if the dispatch
    /// thread cannot be created; in the latter case all state built so far
    /// is torn down before the error is returned.
    pub fn start(config: ClockConfig) -> ClockResult<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            gate: SuspendGate::new(),
            removals: Mutex::new(RemovalQueue::new()),
            stop: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
            config,
        });

        let worker = thread::Builder::new()
            .name("softclock-dispatch".into())
            .spawn({
                let shared = Arc::clone(&shared);
                move || run(&shared)
            })?;

        tracing::info!(
            tick_rate_hz = shared.config.tick_rate_hz,
            poll_interval_ms = shared.config.poll_interval.as_millis() as u64,
            "dispatch thread started"
        );

        Ok(Self {
            shared,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Start the clock with [`ClockConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::ThreadSpawn`](crate::error::ClockError) if the
    /// dispatch thread cannot be created.
    pub fn with_defaults() -> ClockResult<Self> {
        Self::start(ClockConfig::default())
    }

    /// Stop the dispatch thread and wait for it to exit.
    ///
    /// Unconditionally effective and idempotent; after it returns no further
    /// handler invocations occur and the clock may be dropped freely. Must
    /// not be called from inside a handler (the join would wait on the
    /// calling thread itself).
    pub fn shutdown(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };

        self.shared.stop.store(true, Ordering::Release);
        self.shared.gate.wake();

        if worker.join().is_err() {
            tracing::error!("dispatch thread panicked before shutdown");
        }
        tracing::info!(
            ticks = self.shared.ticks.load(Ordering::Acquire),
            "dispatch thread stopped"
        );
    }

    /// Register a handler for invocation on every logical tick.
    ///
    /// Takes the gate lock, so registration is ordered before the next
    /// dispatch batch and never races one in progress.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::CapacityExceeded`](crate::error::ClockError)
    /// when [`MAX_HANDLERS`](crate::MAX_HANDLERS) handlers are registered;
    /// the registry is left unchanged.
    pub fn register(&self, handler: TickHandler) -> ClockResult<()> {
        self.shared.gate.lock().insert(handler)
    }

    /// Unregister a handler, immediately when possible, deferred otherwise.
    ///
    /// The gate lock is probed without blocking. If it is free the handler
    /// is removed on the spot. If it is held (notably when this call is
    /// reentrant from inside a handler the dispatch thread is currently
    /// invoking) the request is staged on an independently locked queue
    /// drained by the dispatch thread at the end of the batch, and the
    /// call reports success optimistically. Removal is therefore immediate
    /// or bounded-delay, never blocking and never deadlocking; a handler
    /// that unregisters itself is not invoked again after the batch that
    /// staged the removal.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::NotRegistered`](crate::error::ClockError) if
    /// the handler is unknown, checked on the immediate path only; a stale
    /// deferred target is dropped silently.
    pub fn unregister(&self, handler: &TickHandler) -> ClockResult<()> {
        match self.shared.gate.try_lock() {
            Some(mut table) => table.remove(handler),
            None => {
                self.shared.removals.lock().push(handler.clone());
                Ok(())
            }
        }
    }

    /// Prevent the next dispatch batch from starting. Nests; a batch already
    /// in progress is not preempted.
    pub fn suspend(&self) {
        self.shared.gate.suspend();
    }

    /// Balance one [`suspend`](Self::suspend); the outermost call resumes
    /// dispatch.
    pub fn resume(&self) {
        self.shared.gate.resume();
    }

    /// Whether dispatch is currently suspended.
    ///
    /// Lock-free; safe to call from inside a running handler.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.shared.gate.is_suspended()
    }

    /// Suspend dispatch for the lifetime of the returned guard.
    pub fn suspended(&self) -> SuspendGuard<'_> {
        self.suspend();
        SuspendGuard { clock: self }
    }

    /// Number of currently registered handlers.
    ///
    /// Takes the gate lock; must not be called from inside a handler.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.shared.gate.lock().len()
    }

    /// Total dispatch batches completed since start.
    #[must_use]
    pub fn ticks_dispatched(&self) -> u64 {
        self.shared.ticks.load(Ordering::Acquire)
    }

    /// The configuration the clock was started with.
    #[must_use]
    pub fn config(&self) -> &ClockConfig {
        &self.shared.config
    }
}

impl Drop for SoftClock {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for SoftClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftClock")
            .field("config", &self.shared.config)
            .field("ticks", &self.ticks_dispatched())
            .field("suspended", &self.is_suspended())
            .finish()
    }
}

/// RAII guard that keeps dispatch suspended until dropped.
#[must_use = "dispatch resumes as soon as the guard is dropped"]
pub struct SuspendGuard<'a> {
    clock: &'a SoftClock,
}

impl Drop for SuspendGuard<'_> {
    fn drop(&mut self) {
        self.clock.resume();
    }
}

impl std::fmt::Debug for SuspendGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuspendGuard").finish()
    }
}

/// Elapsed-time to logical-tick conversion with catch-up bounding.
///
/// Accumulates measured nanoseconds and pays out whole ticks by dividing by
/// the tick period; the sub-tick remainder carries over so rounding never
/// loses ticks. Division (rather than multiplication) means arbitrarily
/// large deltas cannot overflow, and the catch-up clamp bounds how many
/// batches one loop iteration may run.
struct TickLedger {
    period_ns: u64,
    max_catchup: u64,
    acc_ns: u64,
}

impl TickLedger {
    fn new(period_ns: u64, max_catchup: u64) -> Self {
        Self {
            period_ns: period_ns.max(1),
            max_catchup,
            acc_ns: 0,
        }
    }

    /// Fold an elapsed interval in and return the whole ticks now owed.
    fn advance(&mut self, elapsed: Duration) -> u64 {
        let ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.acc_ns = self.acc_ns.saturating_add(ns);

        let owed = self.acc_ns / self.period_ns;
        if owed > self.max_catchup {
            // A huge wall-clock jump must not pin the loop replaying
            // history; ticks beyond the bound are abandoned outright.
            tracing::warn!(
                owed,
                max_catchup = self.max_catchup,
                "clamping tick catch-up after large time jump"
            );
            self.acc_ns = 0;
            return self.max_catchup;
        }

        self.acc_ns -= owed * self.period_ns;
        owed
    }
}

/// Dispatch loop body; runs on the `softclock-dispatch` thread.
fn run(shared: &Shared) {
    // Keep asynchronous host signal delivery off this thread for its whole
    // lifetime, so callers' threads always observe it instead.
    mask_async_signals();

    let mut ledger = TickLedger::new(
        shared.config.tick_period_ns(),
        shared.config.max_catchup_ticks,
    );
    let mut last = Instant::now();

    loop {
        let now = Instant::now();
        let mut owed = ledger.advance(now.saturating_duration_since(last));
        last = now;

        while owed > 0 {
            let mut table = shared.gate.lock();
            shared.gate.wait_until_resumed(&mut table, &shared.stop);
            if shared.stop.load(Ordering::Acquire) {
                // Woken for shutdown while parked; no batch was started, so
                // none is abandoned.
                return;
            }

            for handler in table.iter() {
                (**handler)(crate::TICK_FLAG);
            }

            // Apply removals staged by reentrant unregister calls before the
            // next batch can observe them.
            {
                let mut removals = shared.removals.lock();
                for stale in removals.drain() {
                    if table.remove(&stale).is_err() {
                        tracing::trace!("deferred unregistration target already removed");
                    }
                }
            }

            drop(table);
            shared.ticks.fetch_add(1, Ordering::Release);
            owed -= 1;
        }

        thread::sleep(shared.config.poll_interval);
        if shared.stop.load(Ordering::Acquire) {
            // The only exit checkpoint outside the suspended wait; a batch
            // is never abandoned partway through.
            return;
        }
    }
}
