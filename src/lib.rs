//! # paceline
//!
//! **Paceline** is a shared, rate-grouped periodic scheduler for Rust.
//!
//! Components register a unit of work and a desired cycle rate; everyone
//! riding at the same rate shares one background loop (a *driver*) instead
//! of spawning their own timers. Joining and leaving is safe at any moment,
//! including while a cycle is executing: mutations issued mid-cycle are
//! deferred to the next cycle boundary, never applied to an iteration in
//! flight.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌────────────┐  ┌────────────┐  ┌────────────┐
//!  │ component  │  │ component  │  │ component  │   "call me at rate R"
//!  └─────┬──────┘  └─────┬──────┘  └─────┬──────┘
//!        ▼               ▼               ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  DriverPool (process-wide rate → driver registry)         │
//! │  - one Driver per distinct Rate                           │
//! │  - per-driver refcount → assistance sequence numbers      │
//! │  - drained drivers reset their count, relaunch on demand  │
//! └─────┬───────────────────────┬─────────────────────────────┘
//!       ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ Driver @ 50Hz │       │ Driver @ 10Hz │   one cycle loop each
//! └──────┬────────┘       └───────┬───────┘
//!        │ per cycle:             │
//!        │  1. drain pending ops  │   (deferred subscribe/unsubscribe)
//!        │  2. invoke snapshot    │   (each subscriber exactly once)
//!        │  3. publish events     │   CycleFinished / Drained / ...
//!        │  4. adaptive sleep     │   period, or 5× period when idle
//!        ▼                        ▼
//!      Bus ──► ObserverSet ──► observer workers (logging, metrics, ...)
//! ```
//!
//! ### Cycle lifecycle
//! ```text
//! subscribe(token)
//!   ├─ cycle owns the set?  ─► parked in PendingQueue (applied next drain)
//!   ├─ otherwise            ─► active set mutated directly
//!   └─ launch() — idempotent; recreates the backing after drain/stop/fault
//!
//! loop {
//!   ├─► drain:  apply parked ops FIFO          (Phase::Draining)
//!   ├─► invoke: strategy over the snapshot     (Phase::Iterating)
//!   │     ├─ interval: action.call()
//!   │     ├─ barrier:  state = f.apply(state), round done when all bits set
//!   │     └─ step:     object.step()
//!   ├─► CycleFinished{active}; active == 0 → Drained, stop
//!   └─► sleep (worked ? period : 5×period) − elapsed
//! }
//! ```
//!
//! ## Features
//! | Area | Description | Key types / traits |
//! |------|-------------|--------------------|
//! | **Work units** | Register closures, steppable objects, or barrier transforms. | [`Action`], [`ActionFn`], [`Step`], [`Transform`], [`TransformFn`] |
//! | **Drivers** | One loop per rate; safe concurrent membership. | [`Driver`], [`IntervalDriver`], [`BarrierDriver`], [`StepDriver`] |
//! | **Pooling** | Rate-keyed sharing with assistance refcounts. | [`DriverPool`], [`Subscription`], [`shared_pool`] |
//! | **Events** | Cycle/lifecycle/fault events over a broadcast bus. | [`Event`], [`EventKind`], [`Bus`] |
//! | **Observers** | Queue-isolated event consumers. | [`Observe`], [`ObserverSet`], [`LogWriter`] |
//! | **Errors** | Fail-fast config and capacity errors. | [`ConfigError`], [`SubscribeError`] |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::time::Duration;
//! use paceline::{ActionFn, Rate, shared_pool};
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let beats = Arc::new(AtomicU64::new(0));
//!     let counted = Arc::clone(&beats);
//!     let tick = ActionFn::arc("tick", move || {
//!         counted.fetch_add(1, Ordering::Relaxed);
//!     });
//!
//!     // Everyone asking for 50 cycles/sec shares one driver.
//!     let pool = shared_pool();
//!     let sub = pool.register(Rate::per_sec(50.0)?, tick);
//!     sub.engage()?;
//!
//!     tokio::time::sleep(Duration::from_millis(100)).await;
//!     sub.release();
//!
//!     assert!(beats.load(Ordering::Relaxed) >= 2);
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod drivers;
mod error;
mod events;
mod observers;
mod pool;
mod work;

// ---- Public re-exports ----

pub use config::{Backing, DriverConfig, Rate};
pub use core::{
    CycleReport, DrainedHook, Driver, MemberHook, MemberSet, OpKind, PendingOp, PendingQueue,
    Phase, StopHandle, Strategy,
};
pub use drivers::{BarrierCycle, BarrierDriver, IntervalCycle, IntervalDriver, StepCycle,
    StepDriver};
pub use error::{ConfigError, SubscribeError};
pub use events::{Bus, Event, EventKind};
pub use observers::{LogWriter, Observe, ObserverSet};
pub use pool::{DriverPool, Subscription, shared_pool};
pub use work::{Action, ActionFn, ActionRef, Step, StepRef, Token, Transform, TransformFn,
    TransformRef};
