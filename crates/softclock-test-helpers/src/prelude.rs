//! Convenience re-exports for test code.

pub use crate::must::{must, must_err, must_some};
pub use crate::probe::{Probe, wait_until};
