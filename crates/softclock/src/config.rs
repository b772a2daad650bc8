//! Clock manager configuration.

use std::time::Duration;

use crate::error::{ClockError, ClockResult};

/// Configuration for a [`SoftClock`](crate::clock::SoftClock) instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockConfig {
    /// Logical tick rate in ticks per second.
    pub tick_rate_hz: u64,
    /// Sleep granularity of the dispatch loop between catch-up passes.
    pub poll_interval: Duration,
    /// Upper bound on the number of owed ticks dispatched in one loop
    /// iteration. Ticks beyond the bound are discarded.
    pub max_catchup_ticks: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: crate::DEFAULT_TICK_RATE_HZ,
            poll_interval: crate::DEFAULT_POLL_INTERVAL,
            max_catchup_ticks: crate::DEFAULT_TICK_RATE_HZ,
        }
    }
}

impl ClockConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if any value is out of range.
    pub fn validate(&self) -> ClockResult<()> {
        if self.tick_rate_hz == 0 {
            return Err(ClockError::invalid_config(
                "tick_rate_hz must be greater than 0",
            ));
        }
        if self.tick_rate_hz > 1_000_000_000 {
            return Err(ClockError::invalid_config(
                "tick_rate_hz must not exceed 1GHz (sub-nanosecond periods)",
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(ClockError::invalid_config(
                "poll_interval must be greater than 0",
            ));
        }
        if self.max_catchup_ticks == 0 {
            return Err(ClockError::invalid_config(
                "max_catchup_ticks must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Nanoseconds per logical tick at the configured rate.
    #[must_use]
    pub(crate) fn tick_period_ns(&self) -> u64 {
        // tick_rate_hz is validated to be in [1, 1e9], so the period is
        // always at least 1ns and the division cannot be by zero.
        1_000_000_000 / self.tick_rate_hz.max(1)
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> ClockConfigBuilder {
        ClockConfigBuilder::default()
    }
}

/// Builder for [`ClockConfig`].
#[derive(Debug, Default)]
pub struct ClockConfigBuilder {
    config: ClockConfig,
}

impl ClockConfigBuilder {
    /// Set the logical tick rate in ticks per second.
    #[must_use]
    pub fn tick_rate_hz(mut self, hz: u64) -> Self {
        self.config.tick_rate_hz = hz;
        self
    }

    /// Set the dispatch loop sleep granularity.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the catch-up bound in ticks per loop iteration.
    #[must_use]
    pub fn max_catchup_ticks(mut self, ticks: u64) -> Self {
        self.config.max_catchup_ticks = ticks;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> ClockResult<ClockConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
