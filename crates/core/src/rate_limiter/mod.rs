//! Outbound call throttling for the target catalog.
//!
//! Every catalog call is queued on a single [`RateLimiter`] and dispatched in
//! bursts by a background task, so the aggregate request rate stays under the
//! configured ceiling no matter how many matches are in flight.

mod config;
mod dispatcher;

pub use config::RateLimitConfig;
pub use dispatcher::{RateLimiter, RateLimiterStatus};

use thiserror::Error;

/// Errors reported to the caller of [`RateLimiter::execute`].
///
/// A failure of the operation itself is part of its own output and is never
/// mapped to one of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateLimiterError {
    /// The dispatcher task is gone; nothing can be scheduled anymore.
    #[error("Rate limiter is closed")]
    Closed,

    /// The operation was dispatched but never produced a result.
    #[error("Operation aborted before producing a result")]
    Aborted,

    /// The limiter cannot be built from this configuration.
    #[error("Invalid rate limit configuration: {0}")]
    InvalidConfig(String),
}
