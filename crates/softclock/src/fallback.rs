//! Fallback platform support for targets without POSIX signals.

/// No-op: the target has no asynchronous signal delivery to mask.
pub(crate) fn mask_async_signals() {}
