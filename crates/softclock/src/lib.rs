//! # softclock
//!
//! Emulated interrupt clock for platforms that only provide cooperative
//! threads. Subsystems that would normally hang off a hardware timer
//! interrupt (tick counters, input polling, audio mixing) register
//! handlers that one dedicated background thread invokes at a fixed logical
//! tick rate, while any caller can temporarily suspend dispatch around
//! critical, non-reentrant state updates.
//!
//! ## Architecture
//!
//! The crate is organized into focused modules:
//!
//! - [`clock`] - The manager and its tick-driven dispatch loop
//! - [`registry`] - Fixed-capacity handler table with a tight iteration bound
//! - [`pending`] - Staging queue for removals requested from inside a handler
//! - [`config`] - Tick rate, poll granularity, and catch-up bounds
//! - [`error`] - Clock-specific error types
//! - [`prelude`] - Convenience re-exports
//!
//! ## Guarantees
//!
//! - **Tick accounting from elapsed time**: owed ticks accumulate across
//!   slow scheduling and sleep jitter instead of being lost; worst-case
//!   handler latency is roughly the poll granularity.
//! - **Suspension is a happens-before edge**: registry mutation between a
//!   suspend/resume pair is always visible to the next dispatch batch, and
//!   no batch starts while suspended.
//! - **Reentrant unregistration never deadlocks**: a handler may unregister
//!   itself (or any other handler) from inside its own invocation; removal
//!   then completes by the start of the next batch at the latest.
//! - **Shutdown never abandons a batch**: the dispatch thread only exits at
//!   its poll checkpoint or while parked, never mid-invocation.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! use softclock::prelude::*;
//!
//! # fn main() -> ClockResult<()> {
//! let clock = SoftClock::with_defaults()?;
//!
//! let beats = Arc::new(AtomicU64::new(0));
//! let handler: TickHandler = Arc::new({
//!     let beats = beats.clone();
//!     move |_| {
//!         beats.fetch_add(1, Ordering::Relaxed);
//!     }
//! });
//! clock.register(handler.clone())?;
//!
//! // Mutate shared state without racing the dispatch thread.
//! {
//!     let _pause = clock.suspended();
//!     // ... non-reentrant critical update ...
//! }
//!
//! clock.unregister(&handler)?;
//! clock.shutdown();
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(unused_must_use)]

pub mod clock;
pub mod config;
pub mod error;
pub mod pending;
pub mod registry;

mod gate;

#[cfg(unix)]
mod unix;

#[cfg(not(unix))]
mod fallback;

pub mod prelude;

pub use clock::{SoftClock, SuspendGuard};
pub use config::{ClockConfig, ClockConfigBuilder};
pub use error::{ClockError, ClockResult};
pub use registry::{HandlerTable, TickHandler, same_handler};

/// Maximum number of concurrently registered handlers.
pub const MAX_HANDLERS: usize = 16;

/// Flag value passed to every handler invocation.
///
/// Reserved to distinguish invocation modes; there is currently exactly one
/// mode, so the value is always `1`.
pub const TICK_FLAG: u32 = 1;

/// Default logical tick rate (1kHz).
pub const DEFAULT_TICK_RATE_HZ: u64 = 1_000;

/// Default dispatch poll granularity (10ms).
pub const DEFAULT_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(10);
