//! # Driver pool: one shared driver per rate.
//!
//! The pool is the sharing layer: many independent components ask for
//! "call me at rate R" and every distinct rate maps to exactly one driver.
//! The first request at a rate creates and launches the driver; later
//! requests reuse it.
//!
//! Per driver the pool keeps a reference count of active registrations,
//! handed out as sequential "assistance" numbers: the first subscriber of
//! a driver gets 1, the next 2, and so on. When a driver reports drained
//! (its set reached zero and the loop stopped) the count resets to zero
//! through the driver's drained hook, so the next generation of
//! subscribers starts a fresh sequence.
//!
//! ## Rules
//! - At most one driver per distinct [`Rate`] value.
//! - `subscribe` of an already-registered token is a no-op signalled by 0.
//! - Entries are never removed; a drained driver is relaunched in place by
//!   the next registration.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::config::{Backing, DriverConfig, Rate};
use crate::core::{Driver, Strategy};
use crate::drivers::IntervalCycle;
use crate::error::SubscribeError;
use crate::work::{ActionRef, Token};

struct PoolEntry<T, S> {
    driver: Driver<T, S>,
    refs: u32,
}

/// Process-wide registry mapping rates to shared drivers, with per-driver
/// registration counts.
///
/// `DriverPool` is a cheap handle; clones share the same registry.
pub struct DriverPool<T, S> {
    backing: Backing,
    entries: Arc<Mutex<Vec<PoolEntry<T, S>>>>,
}

impl<T, S> Clone for DriverPool<T, S> {
    fn clone(&self) -> Self {
        Self {
            backing: self.backing,
            entries: Arc::clone(&self.entries),
        }
    }
}

fn lock<X>(m: &Mutex<X>) -> MutexGuard<'_, X> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Token, S: Strategy<T> + Default> DriverPool<T, S> {
    /// Creates an empty pool whose drivers run on the given backing.
    pub fn new(backing: Backing) -> Self {
        Self {
            backing,
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns the driver for `rate`, creating and launching it on first
    /// request.
    pub fn acquire(&self, rate: Rate) -> Driver<T, S> {
        let mut entries = lock(&self.entries);
        if let Some(entry) = entries.iter().find(|e| e.driver.rate() == rate) {
            return entry.driver.clone();
        }
        let config = DriverConfig::at_rate(rate).with_backing(self.backing);
        let driver = Driver::new(config, S::default());
        driver.launch();
        entries.push(PoolEntry {
            driver: driver.clone(),
            refs: 0,
        });
        driver
    }

    /// Registers `token` with `driver` and returns its assistance sequence
    /// number, or 0 when the token was already registered (no-op signal).
    ///
    /// On the first registration for a driver, the drained hook is attached
    /// so the entry's count resets when the driver's set drains to empty.
    pub fn subscribe(&self, driver: &Driver<T, S>, token: T) -> Result<u32, SubscribeError> {
        let mut entries = lock(&self.entries);
        let idx = match entries.iter().position(|e| e.driver.same_driver(driver)) {
            Some(idx) => idx,
            None => {
                // A driver constructed outside acquire(): adopt it.
                entries.push(PoolEntry {
                    driver: driver.clone(),
                    refs: 0,
                });
                entries.len() - 1
            }
        };

        if !entries[idx].driver.has_drained_hook() {
            let shared = Arc::clone(&self.entries);
            entries[idx].driver.set_drained_hook(Arc::new(move || {
                if let Some(entry) = lock(&shared).get_mut(idx) {
                    entry.refs = 0;
                }
            }));
        }

        if entries[idx].driver.is_subscribed(&token) {
            return Ok(0);
        }
        entries[idx].driver.subscribe(token)?;
        entries[idx].refs += 1;
        Ok(entries[idx].refs)
    }

    /// Deregisters `token` from `driver` and returns the remaining count.
    ///
    /// Unknown tokens (and unknown drivers) leave the count unchanged.
    pub fn unsubscribe(&self, driver: &Driver<T, S>, token: &T) -> u32 {
        let mut entries = lock(&self.entries);
        let Some(entry) = entries
            .iter_mut()
            .find(|e| e.driver.same_driver(driver))
        else {
            return 0;
        };
        if entry.driver.is_subscribed(token) {
            entry.driver.unsubscribe(token);
            entry.refs = entry.refs.saturating_sub(1);
        }
        entry.refs
    }

    /// Bundles a pool, its driver for `rate`, and a token into a
    /// [`Subscription`] handle. Registration happens on
    /// [`Subscription::engage`], not here.
    pub fn register(&self, rate: Rate, token: T) -> Subscription<T, S> {
        Subscription {
            driver: self.acquire(rate),
            pool: self.clone(),
            token,
        }
    }

    /// Requests stop on every pooled driver and waits for each loop to
    /// exit. Used for process shutdown draining.
    pub async fn shutdown(&self) {
        let handles: Vec<_> = lock(&self.entries)
            .iter()
            .map(|e| e.driver.request_stop())
            .collect();
        for handle in handles {
            handle.wait().await;
        }
    }

    /// Number of pooled drivers (distinct rates seen so far).
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// True if no driver was ever acquired.
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl<T: Token, S: Strategy<T> + Default> Default for DriverPool<T, S> {
    fn default() -> Self {
        Self::new(Backing::default())
    }
}

/// One component's handle on a pooled registration.
///
/// Bundles the pool, the rate-matched driver and the component's token, so
/// call sites toggle assistance without threading all three around.
pub struct Subscription<T: Token, S: Strategy<T> + Default> {
    pool: DriverPool<T, S>,
    driver: Driver<T, S>,
    token: T,
}

impl<T: Token, S: Strategy<T> + Default> Subscription<T, S> {
    /// Registers the token; returns its assistance sequence number, or 0
    /// when already engaged.
    pub fn engage(&self) -> Result<u32, SubscribeError> {
        self.pool.subscribe(&self.driver, self.token.clone())
    }

    /// Deregisters the token; returns the driver's remaining count.
    pub fn release(&self) -> u32 {
        self.pool.unsubscribe(&self.driver, &self.token)
    }

    /// True while the token is registered.
    pub fn is_engaged(&self) -> bool {
        self.driver.is_subscribed(&self.token)
    }

    /// The shared driver this subscription rides on.
    pub fn driver(&self) -> &Driver<T, S> {
        &self.driver
    }
}

/// The process-wide action-driver pool.
///
/// Components that just want "call this closure every N ticks" share this
/// registry instead of wiring a pool through their constructors.
pub fn shared_pool() -> &'static DriverPool<ActionRef, IntervalCycle> {
    static SHARED: OnceLock<DriverPool<ActionRef, IntervalCycle>> = OnceLock::new();
    SHARED.get_or_init(DriverPool::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Phase;
    use crate::work::ActionFn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type ActionPool = DriverPool<ActionRef, IntervalCycle>;

    fn rate(cycles: f64) -> Rate {
        Rate::per_sec(cycles).unwrap()
    }

    fn noop(name: &'static str) -> ActionRef {
        ActionFn::arc(name, || {})
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn equal_rates_share_one_driver() {
        let pool = ActionPool::default();
        let a = pool.acquire(rate(40.0));
        let b = pool.acquire(rate(40.0));
        let c = pool.acquire(rate(80.0));

        assert!(a.same_driver(&b));
        assert!(!a.same_driver(&c));
        assert_eq!(pool.len(), 2);
        pool.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn assistance_numbers_are_sequential_per_driver() {
        let pool = ActionPool::default();
        let driver = pool.acquire(rate(100.0));
        let (t1, t2) = (noop("t1"), noop("t2"));

        assert_eq!(pool.subscribe(&driver, t1.clone()).unwrap(), 1);
        assert_eq!(pool.subscribe(&driver, t2.clone()).unwrap(), 2);
        // Already registered: no-op signal.
        assert_eq!(pool.subscribe(&driver, t1.clone()).unwrap(), 0);

        assert_eq!(pool.unsubscribe(&driver, &t2), 1);
        // Unknown token: count unchanged.
        assert_eq!(pool.unsubscribe(&driver, &t2), 1);

        pool.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn drained_driver_resets_its_count() {
        let pool = ActionPool::default();
        let driver = pool.acquire(rate(200.0));
        let t = noop("t");

        assert_eq!(pool.subscribe(&driver, t.clone()).unwrap(), 1);

        // Deregister behind the pool's back: the driver drains, stops, and
        // the drained hook must zero the stale count.
        driver.unsubscribe(&t);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(driver.phase(), Phase::Stopped);

        let fresh = noop("fresh");
        assert_eq!(pool.subscribe(&driver, fresh).unwrap(), 1);
        pool.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shutdown_stops_every_pooled_driver() {
        let pool = ActionPool::default();
        let slow = pool.acquire(rate(50.0));
        let fast = pool.acquire(rate(500.0));
        pool.subscribe(&slow, noop("s")).unwrap();
        pool.subscribe(&fast, noop("f")).unwrap();

        pool.shutdown().await;
        assert_eq!(slow.phase(), Phase::Stopped);
        assert_eq!(fast.phase(), Phase::Stopped);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn subscription_wrapper_round_trip() {
        let pool = ActionPool::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let tick = ActionFn::arc("tick", move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        let sub = pool.register(rate(100.0), tick);
        assert!(!sub.is_engaged());
        assert_eq!(sub.engage().unwrap(), 1);
        assert!(sub.is_engaged());
        assert_eq!(sub.engage().unwrap(), 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(hits.load(Ordering::SeqCst) >= 1);

        assert_eq!(sub.release(), 0);
        assert!(!sub.is_engaged());
        pool.shutdown().await;
    }
}
