//! # Invocation strategies.
//!
//! One generic [`Driver`](crate::Driver) covers every variant; what differs
//! per variant lives behind [`Strategy`]:
//! - how the cycle's invoke phase calls a subscriber (delegate call, step
//!   call, barrier transform),
//! - what a deferred mutation looks like (directed add/remove vs toggle),
//! - any variant-private registration state (the barrier's bit table).
//!
//! Methods take `&self`: a strategy that keeps registration state guards it
//! with its own fine-grained lock, held only around table access — never
//! across a subscriber invocation, so caller-facing operations cannot be
//! blocked by a slow subscriber.
//!
//! The strategy runs with the cycle's membership **snapshot**, never the
//! live set, so it cannot observe mid-cycle mutations.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::core::pending::PendingOp;
use crate::error::SubscribeError;
use crate::events::{Bus, Event};
use crate::work::Token;

/// Direction of a caller-issued membership mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpKind {
    /// `subscribe` was called.
    Add,
    /// `unsubscribe` was called.
    Remove,
}

/// What one invoke phase accomplished.
pub struct CycleReport {
    /// Number of subscribers actually invoked this cycle.
    ///
    /// May be less than the snapshot size: the barrier skips subscribers
    /// whose bit is already set.
    pub invoked: usize,
    /// The driver should stop after this cycle (one-shot barrier cleared).
    pub halt: bool,
}

impl CycleReport {
    /// Report for a phase that invoked `invoked` subscribers and keeps going.
    pub fn invoked(invoked: usize) -> Self {
        Self {
            invoked,
            halt: false,
        }
    }
}

/// Variant behavior plugged into the generic driver.
pub trait Strategy<T: Token>: Send + Sync + 'static {
    /// Reserves variant-private registration state for a new subscriber.
    ///
    /// Runs synchronously inside `subscribe`, before any membership change;
    /// an `Err` rejects the registration outright.
    fn reserve(&self, token: &T) -> Result<(), SubscribeError> {
        let _ = token;
        Ok(())
    }

    /// Releases whatever [`Strategy::reserve`] took. Runs on every
    /// `unsubscribe`, including for tokens that were never reserved.
    fn release(&self, token: &T) {
        let _ = token;
    }

    /// Translates a caller mutation into the deferred op this variant parks
    /// while a cycle owns the set.
    ///
    /// Directed add/remove by default; the step driver overrides this with
    /// toggle semantics.
    fn defer(&self, token: T, requested: OpKind) -> PendingOp<T> {
        match requested {
            OpKind::Add => PendingOp::Add(token),
            OpKind::Remove => PendingOp::Remove(token),
        }
    }

    /// Authoritative membership answer, if this variant keeps its own
    /// registration table (the barrier does). `None` defers to the
    /// driver's member set.
    fn contains(&self, token: &T) -> Option<bool> {
        let _ = token;
        None
    }

    /// Runs one invoke phase over the cycle's snapshot.
    ///
    /// Must invoke every due subscriber exactly once and isolate subscriber
    /// panics (see [`invoke_guarded`]).
    fn run_cycle(&self, snapshot: &[T], bus: &Bus) -> CycleReport;
}

/// Invokes one subscriber with panic isolation.
///
/// A panic is caught, published on the driver bus as `SubscriberPanicked`
/// and logged; the caller continues with the next subscriber. Returns
/// `None` when the invocation panicked.
pub(crate) fn invoke_guarded<R>(bus: &Bus, name: &str, f: impl FnOnce() -> R) -> Option<R> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            let reason = payload_text(payload.as_ref());
            log::warn!("subscriber '{name}' panicked: {reason}");
            bus.publish(Event::subscriber_panicked(name, reason));
            None
        }
    }
}

fn payload_text(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
