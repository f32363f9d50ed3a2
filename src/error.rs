//! Error types used by the paceline scheduler.
//!
//! This module defines two main error enums:
//!
//! - [`ConfigError`] — rejected driver configuration (invalid rates/periods).
//! - [`SubscribeError`] — a registration the target driver cannot accept.
//!
//! Both types provide an `as_label` helper for logging/metrics. Subscriber
//! *invocation* failures are deliberately absent here: a panicking subscriber
//! is caught inside the cycle loop and reported through the driver's event
//! bus ([`EventKind::SubscriberPanicked`](crate::EventKind::SubscriberPanicked)),
//! never propagated to callers.

use thiserror::Error;

/// # Errors raised while validating driver configuration.
///
/// These are surfaced synchronously, before any driver state is created:
/// a driver never starts with a degenerate cycle period.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Requested cycle rate was zero, negative, or non-finite.
    #[error("cycle rate must be a positive finite number, got {rate}")]
    InvalidRate {
        /// The rejected rate value (cycles per second).
        rate: f64,
    },

    /// The requested period rounds down to zero in the scheduler's time unit.
    #[error("cycle period must be non-zero")]
    ZeroPeriod,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use paceline::ConfigError;
    ///
    /// let err = ConfigError::InvalidRate { rate: 0.0 };
    /// assert_eq!(err.as_label(), "config_invalid_rate");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvalidRate { .. } => "config_invalid_rate",
            ConfigError::ZeroPeriod => "config_zero_period",
        }
    }
}

/// # Errors raised by a driver refusing a registration.
///
/// The only refusal a driver knows is capacity: the barrier variant owns a
/// 64-bit word and can therefore track at most 64 concurrent subscribers.
/// Plain interval and step drivers accept every registration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeError {
    /// Every bit of the barrier word is already reserved.
    ///
    /// The subscriber was **not** registered; nothing needs to be undone.
    #[error("barrier is full: all {limit} slots are reserved")]
    BarrierFull {
        /// Maximum number of concurrent barrier subscribers (64).
        limit: usize,
    },
}

impl SubscribeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubscribeError::BarrierFull { .. } => "subscribe_barrier_full",
        }
    }
}
