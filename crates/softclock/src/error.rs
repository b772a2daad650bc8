//! Error types for the clock manager.

use thiserror::Error;

/// Errors that can occur while operating the clock manager.
#[derive(Debug, Error)]
pub enum ClockError {
    /// The handler table is full; no further handlers can be registered.
    #[error("handler capacity exceeded ({capacity} slots)")]
    CapacityExceeded {
        /// The fixed capacity of the handler table.
        capacity: usize,
    },

    /// The handler passed to an immediate removal was not registered.
    #[error("handler is not registered")]
    NotRegistered,

    /// Invalid configuration provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The dispatch thread could not be spawned.
    #[error("failed to spawn dispatch thread")]
    ThreadSpawn(#[from] std::io::Error),
}

impl ClockError {
    /// Create a capacity-exceeded error.
    #[must_use]
    pub fn capacity_exceeded(capacity: usize) -> Self {
        Self::CapacityExceeded { capacity }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// A specialized `Result` type for clock operations.
pub type ClockResult<T = ()> = std::result::Result<T, ClockError>;
