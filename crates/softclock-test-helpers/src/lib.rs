//! Shared test utilities for softclock.
//!
//! This crate provides common helpers used across the test suite for timing
//! assertions against a live dispatch thread, where fixed sleeps alone make
//! tests slow or flaky.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`probe`] - Invocation counting and deadline polling
//! - [`prelude`] - Convenience re-exports

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]

pub mod must;
pub mod probe;
pub mod prelude;

pub use must::*;
pub use probe::{Probe, wait_until};
