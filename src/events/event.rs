//! # Events emitted by a driver.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Cycle events**: one per cycle, plus the terminal drain notification
//! - **Lifecycle events**: launch/stop transitions of the driver itself
//! - **Fault events**: isolated subscriber failures
//!
//! The [`Event`] struct carries optional metadata such as the active
//! subscriber count, the barrier word, and failure reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically across all drivers in the process. Use `seq` to restore
//! the exact order when events are observed out of order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of driver events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Cycle events ===
    /// One cycle finished (drain + invoke phases done).
    ///
    /// Sets:
    /// - `active`: number of subscribers active this cycle
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    CycleFinished,

    /// The active set reached zero and the driver is stopping.
    ///
    /// Fired exactly once per run of the cycle loop.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Drained,

    /// Every barrier subscriber's bit is set; the round is complete.
    ///
    /// Sets:
    /// - `state`: the shared barrier word at completion
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    BarrierCleared,

    // === Lifecycle events ===
    /// The cycle loop was spawned on its backing context.
    Launched,

    /// A caller requested a cooperative stop.
    StopRequested,

    /// The cycle loop exited and the active set was cleared.
    Stopped,

    // === Fault events ===
    /// A subscriber panicked during its invocation.
    ///
    /// The panic was caught; the cycle continued with the next subscriber.
    ///
    /// Sets:
    /// - `subscriber`: diagnostic name of the offender
    /// - `reason`: panic payload, if printable
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberPanicked,
}

/// Driver event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Number of active subscribers (cycle events).
    pub active: Option<usize>,
    /// Shared barrier word (barrier events).
    pub state: Option<u64>,
    /// Diagnostic name of the subscriber involved, if any.
    pub subscriber: Option<Arc<str>>,
    /// Human-readable reason (panic payloads, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next global sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            active: None,
            state: None,
            subscriber: None,
            reason: None,
        }
    }

    /// Attaches the active subscriber count.
    #[inline]
    pub fn with_active(mut self, active: usize) -> Self {
        self.active = Some(active);
        self
    }

    /// Attaches the shared barrier word.
    #[inline]
    pub fn with_state(mut self, state: u64) -> Self {
        self.state = Some(state);
        self
    }

    /// Attaches a subscriber's diagnostic name.
    #[inline]
    pub fn with_subscriber(mut self, name: impl Into<Arc<str>>) -> Self {
        self.subscriber = Some(name.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(name: impl Into<Arc<str>>, reason: impl Into<Arc<str>>) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_subscriber(name)
            .with_reason(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::now(EventKind::CycleFinished);
        let b = Event::now(EventKind::CycleFinished);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_set_fields() {
        let ev = Event::now(EventKind::BarrierCleared)
            .with_state(0b1011)
            .with_active(3);
        assert_eq!(ev.state, Some(0b1011));
        assert_eq!(ev.active, Some(3));
        assert_eq!(ev.kind, EventKind::BarrierCleared);
    }
}
