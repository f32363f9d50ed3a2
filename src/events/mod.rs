//! Driver events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by a driver's cycle loop.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the cycle loop (`CycleFinished`, `Drained`,
//!   `BarrierCleared`, `SubscriberPanicked`) and the driver's lifecycle
//!   operations (`Launched`, `StopRequested`, `Stopped`).
//! - **Consumers**: anything holding a receiver from [`Bus::subscribe`],
//!   typically the [`ObserverSet`](crate::ObserverSet) listener.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
