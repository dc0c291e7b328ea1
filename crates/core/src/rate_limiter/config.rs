//! Rate limiter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::RateLimiterError;

/// Configuration for the outbound call rate limiter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitConfig {
    /// Ceiling on the average number of catalog calls per second.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Maximum number of queued calls released together.
    #[serde(default = "default_burst_size")]
    pub burst_size: usize,

    /// Maximum number of calls waiting in the queue.
    /// Callers wait for space once the queue is full.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_requests_per_second() -> f64 {
    1.0
}

fn default_burst_size() -> usize {
    1
}

fn default_queue_capacity() -> usize {
    256
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl RateLimitConfig {
    /// Minimum time between two bursts.
    ///
    /// A full burst of `burst_size` calls every `burst_size / rate` seconds
    /// averages exactly `requests_per_second`. A rate that is zero, negative
    /// or NaN (or so small the interval overflows) is rejected.
    pub fn dispatch_interval(&self) -> Result<Duration, RateLimiterError> {
        let burst = self.burst_size.max(1) as f64;
        Duration::try_from_secs_f64(burst / self.requests_per_second).map_err(|_| {
            RateLimiterError::InvalidConfig(format!(
                "requests_per_second must be positive, got {}",
                self.requests_per_second
            ))
        })
    }
}
