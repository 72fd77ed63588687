//! Retry policy for the HTTP transmitter.
//!
//! This module re-exports the universal retry abstraction from
//! `beaconkit-core` with HTTP-specific defaults matching this SDK's
//! delivery contract: up to 3 retries, doubling from a 1 second base delay.

use crate::error::TransportError;
use std::time::Duration;
pub use beaconkit_core::retry::{BackoffStrategy, ExponentialBackoff, ExponentialBackoffBuilder};

/// HTTP-specific retry policy.
///
/// A thin wrapper around `ExponentialBackoff` configured with this SDK's
/// delivery contract: delay doubles from a 1 second base
/// (`initial_delay * 2^attempt`), capped at 30 seconds, up to 3 retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    inner: ExponentialBackoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            inner: ExponentialBackoff::builder()
                .max_retries(3)
                .initial_delay(Duration::from_millis(1000))
                .max_delay(Duration::from_secs(30))
                .multiplier(2.0)
                .jitter(0.0)
                .build(),
        }
    }
}

impl RetryPolicy {
    /// Create a new builder for configuring the HTTP retry policy.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Whether a transport error should be retried.
    ///
    /// Timeouts and connection failures are retried; malformed batches and
    /// a host that has explicitly rejected delivery are not, since retrying
    /// them would only reproduce the same failure.
    pub fn is_retryable(error: &TransportError) -> bool {
        match error {
            TransportError::Timeout => true,
            TransportError::Http(_) => true,
            TransportError::Serialization(_) => false,
            TransportError::HostRejected(_) => false,
            TransportError::AllTransmittersFailed(_) => false,
        }
    }

    /// The underlying `ExponentialBackoff`, for direct access to the full
    /// `BackoffStrategy` API.
    pub fn inner(&self) -> &ExponentialBackoff {
        &self.inner
    }

    /// Delay before retry attempt `attempt` (0-indexed).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        self.inner.next_delay(attempt).unwrap_or(Duration::ZERO)
    }

    /// Maximum number of retries.
    pub fn max_retries(&self) -> u32 {
        self.inner.max_retries()
    }
}

/// Builder for [`RetryPolicy`].
pub struct RetryPolicyBuilder {
    inner: ExponentialBackoffBuilder,
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self {
            inner: ExponentialBackoff::builder()
                .max_retries(3)
                .initial_delay(Duration::from_millis(1000))
                .max_delay(Duration::from_secs(30))
                .multiplier(2.0)
                .jitter(0.0),
        }
    }
}

impl RetryPolicyBuilder {
    /// Set the maximum number of retry attempts.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.inner = self.inner.max_retries(max_retries);
        self
    }

    /// Set the initial delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.inner = self.inner.initial_delay(delay);
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.inner = self.inner.max_delay(delay);
        self
    }

    /// Build the retry policy.
    pub fn build(self) -> RetryPolicy {
        RetryPolicy {
            inner: self.inner.build(),
        }
    }
}
