//! Staging buffer for deferred handler removal.
//!
//! When `unregister` cannot take the gate lock (the call is reentrant from
//! inside a running handler), the handler is parked here instead. The queue
//! has its own lock in the manager, independent of the gate, and is drained
//! only by the dispatch thread at the end of each batch.

use crate::MAX_HANDLERS;
use crate::registry::TickHandler;

/// Fixed-capacity queue of handlers awaiting removal.
///
/// Terminated by convention at the first empty slot. A push onto a full
/// queue drops the request; the deferred path has no caller left to report
/// to, so overflow is logged and swallowed.
pub struct RemovalQueue {
    slots: [Option<TickHandler>; MAX_HANDLERS],
}

impl RemovalQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Stage a handler for removal by the dispatch thread.
    ///
    /// Returns `false` if the queue was full and the request was dropped.
    pub fn push(&mut self, handler: TickHandler) -> bool {
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(handler);
                true
            }
            None => {
                tracing::warn!("removal queue full; dropping deferred unregistration");
                false
            }
        }
    }

    /// Take every staged handler, leaving the queue empty.
    pub fn drain(&mut self) -> impl Iterator<Item = TickHandler> + '_ {
        self.slots.iter_mut().filter_map(Option::take)
    }

    /// Number of staged removals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RemovalQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RemovalQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemovalQueue")
            .field("len", &self.len())
            .finish()
    }
}
