//! # Driver configuration.
//!
//! Provides [`Rate`] (a validated cycle rate), [`Backing`] (where the cycle
//! loop executes) and [`DriverConfig`] (the bundle a driver is built from).
//!
//! A rate is expressed the way callers think about it — cycles per second —
//! and stored as the derived period (`period = 1/rate`). Two rates are the
//! same pool key exactly when their periods are equal, which keeps the
//! rate→driver registry free of float comparisons.
//!
//! ## Sentinel values
//! There are none: invalid rates are rejected at construction
//! ([`ConfigError::InvalidRate`]) instead of being smuggled through as
//! zero periods.

use std::time::Duration;

use crate::error::ConfigError;

/// How many cycles longer the end-of-cycle sleep becomes when a cycle
/// produced no work (adaptive idle backoff).
pub(crate) const IDLE_BACKOFF: u32 = 5;

/// A validated cycle rate, stored as the derived cycle period.
///
/// Equality and hashing operate on the period, so `Rate` can key the
/// driver pool directly.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use paceline::Rate;
///
/// let r = Rate::per_sec(50.0).unwrap();
/// assert_eq!(r.period(), Duration::from_millis(20));
/// assert_eq!(Rate::per_sec(50.0).unwrap(), r);
/// assert!(Rate::per_sec(0.0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rate {
    period: Duration,
}

impl Rate {
    /// Creates a rate from cycles per second.
    ///
    /// Fails fast on zero, negative or non-finite input, and on rates so
    /// high the period truncates to zero nanoseconds.
    pub fn per_sec(cycles: f64) -> Result<Self, ConfigError> {
        if !cycles.is_finite() || cycles <= 0.0 {
            return Err(ConfigError::InvalidRate { rate: cycles });
        }
        let period = Duration::from_secs_f64(1.0 / cycles);
        if period.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(Self { period })
    }

    /// Creates a rate directly from a cycle period.
    pub fn from_period(period: Duration) -> Result<Self, ConfigError> {
        if period.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(Self { period })
    }

    /// Duration of one cycle.
    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// The rate expressed back as cycles per second.
    pub fn cycles_per_sec(&self) -> f64 {
        1.0 / self.period.as_secs_f64()
    }
}

/// Where a driver's cycle loop executes.
///
/// Every driver gets exactly one background execution context; this picks
/// which kind. Mirrors the classic task/long-running/thread trichotomy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backing {
    /// A task on the ambient tokio worker pool.
    ///
    /// Cheapest option; appropriate for loops that spend most of their
    /// time asleep (which is what a periodic driver does).
    #[default]
    Pooled,

    /// A long-running task parked on tokio's blocking pool.
    ///
    /// The loop runs on a thread the async workers never schedule onto,
    /// so a subscriber that blocks cannot starve unrelated pooled work.
    LongRunning,

    /// A dedicated OS thread owned by this driver alone.
    Thread,
}

/// Configuration bundle for constructing a driver.
///
/// ## Field semantics
/// - `rate`: the cycle rate; one cycle lasts `rate.period()`
/// - `backing`: execution context for the cycle loop
/// - `bus_capacity`: ring-buffer size of the driver's event bus
///   (min 1; clamped by [`Bus`](crate::Bus))
/// - `idle_backoff`: sleep multiplier applied after a cycle that produced
///   no work (drained nothing, invoked nobody)
#[derive(Clone, Copy, Debug)]
pub struct DriverConfig {
    /// Cycle rate shared by every subscriber of this driver.
    pub rate: Rate,
    /// Execution context for the cycle loop.
    pub backing: Backing,
    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
    /// Idle sleep multiplier (`idle_backoff × period` when a cycle was empty).
    pub idle_backoff: u32,
}

impl DriverConfig {
    /// Creates a config at the given rate with default backing and capacities.
    pub fn at_rate(rate: Rate) -> Self {
        Self {
            rate,
            backing: Backing::default(),
            bus_capacity: 64,
            idle_backoff: IDLE_BACKOFF,
        }
    }

    /// Returns a config with the backing replaced.
    pub fn with_backing(mut self, backing: Backing) -> Self {
        self.backing = backing;
        self
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_sec_derives_period() {
        assert_eq!(
            Rate::per_sec(100.0).unwrap().period(),
            Duration::from_millis(10)
        );
        assert_eq!(Rate::per_sec(1.0).unwrap().period(), Duration::from_secs(1));
    }

    #[test]
    fn invalid_rates_rejected() {
        assert_eq!(
            Rate::per_sec(0.0),
            Err(ConfigError::InvalidRate { rate: 0.0 })
        );
        assert!(Rate::per_sec(-3.0).is_err());
        assert!(Rate::per_sec(f64::NAN).is_err());
        assert!(Rate::per_sec(f64::INFINITY).is_err());
        assert_eq!(
            Rate::from_period(Duration::ZERO),
            Err(ConfigError::ZeroPeriod)
        );
    }

    #[test]
    fn equal_rates_are_equal_keys() {
        let a = Rate::per_sec(25.0).unwrap();
        let b = Rate::from_period(Duration::from_millis(40)).unwrap();
        assert_eq!(a, b);
    }
}
