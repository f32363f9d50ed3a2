//! # Event observers for driver buses.
//!
//! This module provides the [`Observe`] trait and the fan-out machinery for
//! consuming [`Event`](crate::Event)s off a driver's [`Bus`](crate::Bus)
//! without slowing the cycle loop down.
//!
//! ## Architecture
//! ```text
//! cycle loop ── publish(Event) ──► Bus ──► ObserverSet::attach listener
//!                                              │ (Arc-clone per observer)
//!                                              ├──► [queue O1] ─► worker O1 ─► on_event()
//!                                              ├──► [queue O2] ─► worker O2 ─► on_event()
//!                                              └──► [queue ON] ─► worker ON ─► on_event()
//! ```
//!
//! ## Observer types
//! - **Passive observers** — logging, metrics, alerts ([`LogWriter`])
//! - **Stateful observers** — e.g. a round counter keyed on
//!   `EventKind::CycleFinished`
//!
//! ## Implementing custom observers
//! ```no_run
//! use paceline::{Event, EventKind, Observe};
//! use async_trait::async_trait;
//!
//! struct Metrics;
//!
//! #[async_trait]
//! impl Observe for Metrics {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::SubscriberPanicked {
//!             // increment failure counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "metrics" }
//! }
//! ```

mod log;
mod observe;
mod set;

pub use log::LogWriter;
pub use observe::Observe;
pub use set::ObserverSet;
