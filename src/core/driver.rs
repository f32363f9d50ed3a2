//! # Driver: the cycle loop and its lifecycle.
//!
//! A [`Driver`] is one running periodic-invocation loop for one rate. Every
//! subscriber registered with it is invoked once per cycle; registrations
//! issued while a cycle owns the active set are parked in the deferred
//! queue and applied at the next cycle boundary.
//!
//! ## Cycle anatomy
//! ```text
//! loop {
//!   ├─► record cycle start
//!   ├─► drain phase:   apply pending ops FIFO          (Phase::Draining)
//!   ├─► invoke phase:  snapshot members, run strategy  (Phase::Iterating)
//!   ├─► publish CycleFinished{active}
//!   ├─► active == 0 → fire drained hook once, publish Drained, exit
//!   ├─► halt / stop requested → exit
//!   └─► sleep (worked ? period : idle_backoff×period) − elapsed
//! }
//! on exit (any path, panic included):
//!   Phase::Stopped, members cleared, Stopped published, join watch flipped
//! ```
//!
//! ## Rules
//! - The active set is mutated **only** under the state lock, and never
//!   while an invoke phase runs — the strategy works on a snapshot.
//! - A stop request never aborts an in-flight invoke phase; it cuts the
//!   tail sleep short and the loop exits at the cycle boundary.
//! - A finished or faulted backing context is not restarted in place; the
//!   next [`Driver::launch`] spawns a fresh one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::{DriverConfig, Rate};
use crate::core::members::MemberSet;
use crate::core::pending::PendingQueue;
use crate::core::phase::Phase;
use crate::core::runner::Runner;
use crate::core::strategy::{OpKind, Strategy};
use crate::error::SubscribeError;
use crate::events::{Bus, Event, EventKind};
use crate::work::Token;

/// Hook fired once per run when the active set drains to empty.
pub type DrainedHook = Arc<dyn Fn() + Send + Sync>;

/// Membership, deferred mutations and phase — everything a cycle owns.
struct State<T> {
    members: MemberSet<T>,
    pending: PendingQueue<T>,
    phase: Phase,
}

struct Inner<T, S> {
    label: String,
    rate: Rate,
    idle_backoff: u32,
    runner: Runner,
    bus: Bus,
    state: Mutex<State<T>>,
    strategy: S,
    stop: Mutex<CancellationToken>,
    running: watch::Sender<bool>,
    drained: Mutex<Option<DrainedHook>>,
}

/// Completion handle returned by [`Driver::request_stop`].
///
/// Resolves once the backing context has actually exited the cycle loop.
/// Already resolved when the driver was not running.
pub struct StopHandle {
    rx: watch::Receiver<bool>,
}

impl StopHandle {
    /// True if the cycle loop has already exited.
    pub fn is_complete(&self) -> bool {
        !*self.rx.borrow()
    }

    /// Waits until the cycle loop has exited.
    pub async fn wait(mut self) {
        loop {
            if !*self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// One running periodic-invocation loop for one rate.
///
/// `Driver` is a cheap handle; clones share the same loop. The element type
/// `T` is the subscriber token, `S` the per-variant invocation strategy —
/// see [`IntervalDriver`](crate::IntervalDriver),
/// [`BarrierDriver`](crate::BarrierDriver), [`StepDriver`](crate::StepDriver).
pub struct Driver<T, S> {
    inner: Arc<Inner<T, S>>,
}

impl<T, S> Clone for Driver<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn lock<X>(m: &Mutex<X>) -> MutexGuard<'_, X> {
    // A panicking subscriber is already isolated by catch_unwind, so state
    // behind a poisoned lock is never torn.
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Token, S: Strategy<T>> Driver<T, S> {
    /// Creates a driver at the configured rate. Nothing runs until
    /// [`Driver::launch`] (which [`Driver::subscribe`] calls for you).
    pub fn new(config: DriverConfig, strategy: S) -> Self {
        let label = format!("paceline-{:.0}hz", config.rate.cycles_per_sec());
        let (running, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                label,
                rate: config.rate,
                idle_backoff: config.idle_backoff.max(1),
                runner: Runner::new(config.backing),
                bus: Bus::new(config.bus_capacity_clamped()),
                state: Mutex::new(State {
                    members: MemberSet::new(),
                    pending: PendingQueue::new(),
                    phase: Phase::Idle,
                }),
                strategy,
                stop: Mutex::new(CancellationToken::new()),
                running,
                drained: Mutex::new(None),
            }),
        }
    }

    /// The cycle rate this driver was built for.
    pub fn rate(&self) -> Rate {
        self.inner.rate
    }

    /// Duration of one cycle.
    pub fn period(&self) -> Duration {
        self.inner.rate.period()
    }

    /// Current lifecycle phase (a snapshot; may change immediately after).
    pub fn phase(&self) -> Phase {
        lock(&self.inner.state).phase
    }

    /// Number of currently active subscribers (deferred ops not counted).
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.state).members.len()
    }

    /// The driver's event bus.
    pub fn bus(&self) -> Bus {
        self.inner.bus.clone()
    }

    /// True if both handles drive the same loop.
    pub fn same_driver(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Registers `token` and ensures the loop is running.
    ///
    /// If a cycle currently owns the active set the registration is parked
    /// and applied at the next cycle boundary; otherwise it takes effect
    /// immediately. Either way the driver is launched afterwards
    /// (idempotent).
    ///
    /// Fails only when the variant refuses the registration (barrier
    /// capacity); nothing is registered in that case.
    pub fn subscribe(&self, token: T) -> Result<(), SubscribeError> {
        {
            let mut state = lock(&self.inner.state);
            self.inner.strategy.reserve(&token)?;
            if state.phase.cycle_owns_set() {
                let op = self.inner.strategy.defer(token, OpKind::Add);
                state.pending.push(op);
            } else {
                state.members.add(token);
            }
        }
        self.launch();
        Ok(())
    }

    /// Deregisters `token`; a no-op for tokens that were never subscribed.
    ///
    /// Symmetric to [`Driver::subscribe`]: parked while a cycle owns the
    /// set, immediate otherwise. A token removed mid-cycle still receives
    /// its invocation for the cycle already in flight.
    pub fn unsubscribe(&self, token: &T) {
        let mut state = lock(&self.inner.state);
        self.inner.strategy.release(token);
        if state.phase.cycle_owns_set() {
            let op = self.inner.strategy.defer(token.clone(), OpKind::Remove);
            state.pending.push(op);
        } else {
            state.members.remove(token);
        }
    }

    /// True if `token` is registered, counting parked mutations.
    ///
    /// Answers from the effective membership (active set folded with the
    /// deferred queue), or from the variant's own registration table when
    /// it keeps one (barrier).
    pub fn is_subscribed(&self, token: &T) -> bool {
        let state = lock(&self.inner.state);
        if let Some(answer) = self.inner.strategy.contains(token) {
            return answer;
        }
        let current = state.members.contains(token);
        state.pending.effect_on(token, current)
    }

    /// Installs the drained hook, replacing any previous one.
    ///
    /// Fired once per run of the cycle loop, when the active set reaches
    /// zero. The driver pool uses this to reset its refcount entry.
    pub fn set_drained_hook(&self, hook: DrainedHook) {
        *lock(&self.inner.drained) = Some(hook);
    }

    /// True if a drained hook is installed.
    pub fn has_drained_hook(&self) -> bool {
        lock(&self.inner.drained).is_some()
    }

    /// Starts the cycle loop if it is not already running.
    ///
    /// Idempotent. After a drain, stop, or backing fault, a fresh backing
    /// context (and stop token) is created.
    pub fn launch(&self) {
        let stop = {
            let mut state = lock(&self.inner.state);
            match state.phase {
                Phase::Idle | Phase::Stopped => state.phase = Phase::Running,
                _ => return,
            }
            let stop = CancellationToken::new();
            *lock(&self.inner.stop) = stop.clone();
            let _ = self.inner.running.send_replace(true);
            stop
        };

        let spawned = self
            .inner
            .runner
            .spawn(&self.inner.label, cycle_loop(Arc::clone(&self.inner), stop));
        if spawned {
            self.inner.bus.publish(Event::now(EventKind::Launched));
        } else {
            let mut state = lock(&self.inner.state);
            state.phase = Phase::Stopped;
            let _ = self.inner.running.send_replace(false);
        }
    }

    /// Requests a cooperative stop and returns a join handle.
    ///
    /// The cycle already in flight finishes (the invoke phase is never
    /// aborted); only the end-of-cycle sleep is cut short. The handle is
    /// already complete when the driver is not running.
    pub fn request_stop(&self) -> StopHandle {
        let running = {
            let state = lock(&self.inner.state);
            lock(&self.inner.stop).cancel();
            state.phase.is_live()
        };
        if running {
            self.inner.bus.publish(Event::now(EventKind::StopRequested));
        }
        StopHandle {
            rx: self.inner.running.subscribe(),
        }
    }
}

/// Marks the driver stopped when the loop exits — on every path, a backing
/// fault included, so the next launch can transparently recreate it.
///
/// The drained exit performs the stop transition itself (atomically with
/// the drained decision) and disarms the guard; this guard covers the
/// stop-requested, halt and fault paths, where the active set is cleared.
struct ExitGuard<T: Token, S: Strategy<T>> {
    inner: Arc<Inner<T, S>>,
    armed: bool,
}

impl<T: Token, S: Strategy<T>> ExitGuard<T, S> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<T: Token, S: Strategy<T>> Drop for ExitGuard<T, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        {
            let mut state = lock(&self.inner.state);
            state.phase = Phase::Stopped;
            state.members.replace_all(Vec::new());
            let _ = self.inner.running.send_replace(false);
        }
        self.inner.bus.publish(Event::now(EventKind::Stopped));
    }
}

fn phase_after(stop: &CancellationToken) -> Phase {
    if stop.is_cancelled() {
        Phase::Stopping
    } else {
        Phase::Running
    }
}

async fn cycle_loop<T: Token, S: Strategy<T>>(inner: Arc<Inner<T, S>>, stop: CancellationToken) {
    let mut guard = ExitGuard {
        inner: Arc::clone(&inner),
        armed: true,
    };
    let period = inner.rate.period();
    let idle = period * inner.idle_backoff;

    loop {
        let started = Instant::now();
        let mut worked = false;

        // Drain phase: apply parked mutations FIFO.
        {
            let mut state = lock(&inner.state);
            if !state.pending.is_empty() {
                state.phase = Phase::Draining;
                let State {
                    members, pending, ..
                } = &mut *state;
                pending.apply(members);
                state.phase = phase_after(&stop);
                worked = true;
            }
        }

        // Invoke phase: snapshot under the lock, invoke without it.
        let snapshot = {
            let mut state = lock(&inner.state);
            if state.members.is_empty() {
                Vec::new()
            } else {
                state.phase = Phase::Iterating;
                state.members.snapshot()
            }
        };
        let active = snapshot.len();
        let mut halt = false;
        if active > 0 {
            let report = inner.strategy.run_cycle(&snapshot, &inner.bus);
            if report.invoked > 0 {
                worked = true;
            }
            halt = report.halt;
            lock(&inner.state).phase = phase_after(&stop);
        }

        inner.bus.publish(Event::now(EventKind::CycleFinished).with_active(active));

        if active == 0 {
            let finished = {
                let mut state = lock(&inner.state);
                if state.members.is_empty() && state.pending.is_empty() {
                    // Decide and transition atomically: a subscribe landing
                    // after this lock sees Stopped and relaunches.
                    state.phase = Phase::Stopped;
                    let _ = inner.running.send_replace(false);
                    true
                } else {
                    // A registration raced the drain decision; keep cycling.
                    false
                }
            };
            if !finished {
                continue;
            }
            guard.disarm();
            let hook = lock(&inner.drained).clone();
            if let Some(hook) = hook {
                hook();
            }
            inner.bus.publish(Event::now(EventKind::Drained));
            inner.bus.publish(Event::now(EventKind::Stopped));
            return;
        }

        if halt || stop.is_cancelled() {
            return;
        }

        let budget = if worked { period } else { idle };
        if let Some(sleep_for) = budget.checked_sub(started.elapsed()) {
            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = stop.cancelled() => {}
            }
        }
        if stop.is_cancelled() {
            return;
        }
    }
}
