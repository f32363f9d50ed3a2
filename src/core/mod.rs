//! Driver core: membership, deferred mutation, and the cycle loop.
//!
//! This module contains the machinery every driver variant shares. The
//! variant-specific pieces (how a subscriber is invoked, what deferral
//! means) plug in through [`Strategy`]; the concrete variants live in
//! [`crate::drivers`].
//!
//! Internal modules:
//! - [`phase`]: named lifecycle states (cooperative signal, not a lock);
//! - [`members`]: identity-keyed membership with external hooks;
//! - [`pending`]: deferred mutation FIFO applied at cycle boundaries;
//! - [`runner`]: backing contexts (pooled task / blocking pool / OS thread);
//! - [`strategy`]: per-variant invocation behavior;
//! - [`driver`]: the cycle loop and driver lifecycle.

mod driver;
mod members;
mod pending;
mod phase;
mod runner;
mod strategy;

pub use driver::{DrainedHook, Driver, StopHandle};
pub use members::{MemberHook, MemberSet};
pub use pending::{PendingOp, PendingQueue};
pub use phase::Phase;
pub use strategy::{CycleReport, OpKind, Strategy};

pub(crate) use strategy::invoke_guarded;
