//! Nesting suspend gate guarding the handler table.
//!
//! The gate pairs a counter with a condvar: while the counter is above zero
//! the dispatch thread will not start a new invocation batch, and the
//! outermost `resume` wakes it. The handler table lives under the gate's
//! mutex, so holding the gate lock *is* the exclusive-access mechanism for
//! registry mutation; any mutation between a matching suspend/resume pair
//! (or under the lock directly) is ordered before the next batch.
//!
//! The depth counter itself is an atomic, always written with the gate lock
//! held but readable without it, so `is_suspended` stays callable from
//! inside a running handler while the dispatch thread holds the lock.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::registry::HandlerTable;

/// Suspend/resume gate for the dispatch loop.
///
/// Suspension never preempts a batch already in progress; it only prevents
/// the next one from starting. Calls nest: every [`suspend`](Self::suspend)
/// must be balanced by exactly one later [`resume`](Self::resume), and only
/// the outermost resume restarts dispatch.
pub struct SuspendGate {
    /// The handler registry, mutated only under this lock.
    handlers: Mutex<HandlerTable>,
    /// Nesting suspend depth; >0 blocks the next batch. Written only with
    /// the `handlers` lock held.
    depth: AtomicU32,
    resumed: Condvar,
}

impl SuspendGate {
    /// Create a gate with an empty handler table and zero depth.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            handlers: Mutex::new(HandlerTable::new()),
            depth: AtomicU32::new(0),
            resumed: Condvar::new(),
        }
    }

    /// Block the next dispatch batch. Nests.
    pub(crate) fn suspend(&self) {
        let _guard = self.handlers.lock();
        self.depth.fetch_add(1, Ordering::Release);
    }

    /// Undo one [`suspend`](Self::suspend); the outermost call wakes the
    /// dispatch thread.
    ///
    /// An unbalanced resume is a caller bug; the depth saturates at zero
    /// rather than wrapping, and debug builds assert.
    pub(crate) fn resume(&self) {
        let _guard = self.handlers.lock();
        let depth = self.depth.load(Ordering::Acquire);
        debug_assert!(depth > 0, "resume without matching suspend");
        self.depth
            .store(depth.saturating_sub(1), Ordering::Release);
        if depth <= 1 {
            self.resumed.notify_all();
        }
    }

    /// Whether dispatch is currently suspended.
    ///
    /// Lock-free: safe to call from inside a running handler even though the
    /// dispatch thread holds the gate lock for the whole batch.
    pub(crate) fn is_suspended(&self) -> bool {
        self.depth.load(Ordering::Acquire) > 0
    }

    /// Exclusive access to the handler table (blocking).
    pub(crate) fn lock(&self) -> MutexGuard<'_, HandlerTable> {
        self.handlers.lock()
    }

    /// Exclusive access to the handler table, or `None` if the lock is held.
    ///
    /// This is the reentrancy probe used by deferred unregistration: a
    /// handler running inside a batch already holds the lock through the
    /// dispatch thread, so its own `try_lock` fails instead of deadlocking.
    pub(crate) fn try_lock(&self) -> Option<MutexGuard<'_, HandlerTable>> {
        self.handlers.try_lock()
    }

    /// Park the dispatch thread until the depth reaches zero or `stop` is
    /// raised. The wait is cooperative (condvar), never a busy spin.
    pub(crate) fn wait_until_resumed(
        &self,
        guard: &mut MutexGuard<'_, HandlerTable>,
        stop: &AtomicBool,
    ) {
        while self.depth.load(Ordering::Acquire) > 0 && !stop.load(Ordering::Acquire) {
            self.resumed.wait(guard);
        }
    }

    /// Wake a waiter regardless of depth; used at shutdown so a suspended
    /// dispatch thread can observe the stop flag.
    ///
    /// Notifies with the gate lock held. A waiter that has checked its
    /// predicate but not yet parked still holds the lock, so the notify
    /// cannot slip into that window and be lost.
    pub(crate) fn wake(&self) {
        let _guard = self.handlers.lock();
        self.resumed.notify_all();
    }
}

impl std::fmt::Debug for SuspendGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.lock();
        f.debug_struct("SuspendGate")
            .field("depth", &self.depth.load(Ordering::Acquire))
            .field("handlers", &*handlers)
            .finish()
    }
}
