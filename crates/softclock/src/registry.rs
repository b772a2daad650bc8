//! Fixed-capacity handler registry with a tight iteration bound.
//!
//! The table stores up to [`MAX_HANDLERS`](crate::MAX_HANDLERS) handlers in
//! slot order and tracks a *high-water mark*: one past the highest occupied
//! slot. Dispatch iterates `[0, mark)` only, so the mark is kept minimal;
//! removing the last occupied handler walks it back past any trailing empty
//! slots. Lookup and removal are linear scans; the capacity is small and
//! fixed, so this is an intentional, bounded cost.

use std::sync::Arc;

use crate::MAX_HANDLERS;
use crate::error::{ClockError, ClockResult};

/// A periodic handler invoked by the dispatch thread.
///
/// The `u32` argument is always [`TICK_FLAG`](crate::TICK_FLAG). Handlers are
/// identified by reference identity, not by value: registering two clones of
/// the same `Arc` registers one identity twice.
pub type TickHandler = Arc<dyn Fn(u32) + Send + Sync>;

/// Whether two handlers are the same registration identity.
///
/// Compares the data pointers of the two `Arc`s, deliberately ignoring
/// vtable addresses (which are not stable across codegen units).
#[must_use]
pub fn same_handler(a: &TickHandler, b: &TickHandler) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

/// Ordered, fixed-capacity table of registered handlers.
///
/// All mutation requires exclusive access; the [`SoftClock`] manager only
/// touches the table behind the suspend gate's lock.
///
/// [`SoftClock`]: crate::clock::SoftClock
pub struct HandlerTable {
    slots: [Option<TickHandler>; MAX_HANDLERS],
    high_water: usize,
}

impl HandlerTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            high_water: 0,
        }
    }

    /// Store a handler in the first empty slot.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::CapacityExceeded`] when all slots are occupied;
    /// the table is left unchanged.
    pub fn insert(&mut self, handler: TickHandler) -> ClockResult<()> {
        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            return Err(ClockError::capacity_exceeded(MAX_HANDLERS));
        };

        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = Some(handler);
        }
        if slot == self.high_water {
            self.high_water += 1;
        }
        Ok(())
    }

    /// Remove a handler by identity.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::NotRegistered`] if no occupied slot below the
    /// high-water mark matches; the table is left unchanged.
    pub fn remove(&mut self, handler: &TickHandler) -> ClockResult<()> {
        let slot = self
            .slots
            .iter()
            .take(self.high_water)
            .position(|entry| entry.as_ref().is_some_and(|h| same_handler(h, handler)))
            .ok_or(ClockError::NotRegistered)?;

        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = None;
        }

        // Restore the tight-bound invariant: no trailing empties below the mark.
        if slot + 1 == self.high_water {
            while self.high_water > 0
                && self
                    .slots
                    .get(self.high_water - 1)
                    .is_some_and(Option::is_none)
            {
                self.high_water -= 1;
            }
        }
        Ok(())
    }

    /// Whether a handler identity is currently registered.
    #[must_use]
    pub fn contains(&self, handler: &TickHandler) -> bool {
        self.iter().any(|h| same_handler(h, handler))
    }

    /// Iterate occupied slots in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &TickHandler> {
        self.slots
            .iter()
            .take(self.high_water)
            .filter_map(Option::as_ref)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.high_water == 0
    }

    /// One past the highest occupied slot.
    #[must_use]
    pub fn high_water(&self) -> usize {
        self.high_water
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerTable")
            .field("len", &self.len())
            .field("high_water", &self.high_water)
            .finish()
    }
}
