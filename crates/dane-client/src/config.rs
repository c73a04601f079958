//! Client configuration types.

use dane_core::{DaneError, Result};
use governor::Quota;
use std::num::NonZeroU32;
use std::time::Duration;

/// Token bucket parameters for batch dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Tokens refilled per second
    pub rate: u32,

    /// Bucket capacity
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(200, 50)
    }
}

impl RateLimitConfig {
    /// Create a rate limit configuration
    #[must_use]
    pub const fn new(rate: u32, burst: u32) -> Self {
        Self { rate, burst }
    }

    /// Convert into a governor quota, rejecting zero values
    pub(crate) fn quota(self) -> Result<Quota> {
        let rate = NonZeroU32::new(self.rate)
            .ok_or_else(|| DaneError::Config("rate must be greater than zero".into()))?;
        let burst = NonZeroU32::new(self.burst)
            .ok_or_else(|| DaneError::Config("burst must be greater than zero".into()))?;
        Ok(Quota::per_second(rate).allow_burst(burst))
    }
}

/// Termination settings for batch scans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Stop once dispatch is done and nothing arrived for this long
    pub idle_timeout: Duration,

    /// Hard upper bound on the whole scan
    pub deadline: Option<Duration>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanConfig {
    /// Create the default scan configuration
    #[must_use]
    pub const fn new() -> Self {
        Self {
            idle_timeout: Duration::from_secs(5),
            deadline: None,
        }
    }

    /// Set the idle timeout
    #[must_use]
    pub const fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the overall deadline
    #[must_use]
    pub const fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}
