//! Prelude module for common clock types.
//!
//! This module provides a convenient way to import the most commonly used
//! types from the crate.

pub use crate::clock::{SoftClock, SuspendGuard};
pub use crate::config::{ClockConfig, ClockConfigBuilder};
pub use crate::error::{ClockError, ClockResult};
pub use crate::registry::{TickHandler, same_handler};
pub use crate::{DEFAULT_POLL_INTERVAL, DEFAULT_TICK_RATE_HZ, MAX_HANDLERS, TICK_FLAG};
