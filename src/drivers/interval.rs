//! # Interval driver: invoke every registered action, once per cycle.
//!
//! The plain variant. Subscribers are [`ActionRef`] handles; the invoke
//! phase calls each one exactly once, with panic isolation, in the cycle
//! snapshot's order.

use crate::config::DriverConfig;
use crate::core::{CycleReport, Driver, Strategy, invoke_guarded};
use crate::events::Bus;
use crate::work::ActionRef;

/// Invocation strategy of the interval driver: plain delegate calls.
#[derive(Default)]
pub struct IntervalCycle;

impl Strategy<ActionRef> for IntervalCycle {
    fn run_cycle(&self, snapshot: &[ActionRef], bus: &Bus) -> CycleReport {
        for action in snapshot {
            invoke_guarded(bus, action.name(), || action.call());
        }
        CycleReport::invoked(snapshot.len())
    }
}

/// Periodic driver invoking zero-argument actions.
pub type IntervalDriver = Driver<ActionRef, IntervalCycle>;

impl IntervalDriver {
    /// Creates an interval driver from the given config.
    pub fn with_config(config: DriverConfig) -> Self {
        Driver::new(config, IntervalCycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Backing, Rate};
    use crate::core::Phase;
    use crate::work::ActionFn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn config(rate: f64) -> DriverConfig {
        DriverConfig::at_rate(Rate::per_sec(rate).unwrap())
    }

    fn counter() -> (ActionRef, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let action = ActionFn::arc("counter", move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        (action, hits)
    }

    #[test]
    fn subscribe_round_trip_without_runtime() {
        // Thread backing: no ambient runtime required.
        let driver =
            IntervalDriver::with_config(config(1000.0).with_backing(Backing::Thread));
        let (action, _) = counter();

        driver.subscribe(action.clone()).unwrap();
        assert!(driver.is_subscribed(&action));
        driver.unsubscribe(&action);
        assert!(!driver.is_subscribed(&action));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn counter_advances_within_rate_bounds() {
        let driver = IntervalDriver::with_config(config(100.0));
        let (action, hits) = counter();
        let started = std::time::Instant::now();
        driver.subscribe(action.clone()).unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        driver.unsubscribe(&action);
        driver.request_stop().wait().await;
        let elapsed = started.elapsed();

        let n = hits.load(Ordering::SeqCst);
        // ≥ 3 periods elapsed; sleep-based timing, so only loose bounds hold.
        let max = (elapsed.as_millis() / 10) as usize + 2;
        assert!(n >= 2, "expected at least 2 cycles, got {n}");
        assert!(n <= max, "expected at most ceil(elapsed/period)+1 cycles, got {n} in {elapsed:?}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_on_idle_driver_completes_immediately() {
        let driver = IntervalDriver::with_config(config(50.0));
        let handle = driver.request_stop();
        assert!(handle.is_complete());
        handle.wait().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn drains_and_stops_when_last_subscriber_leaves() {
        let driver = IntervalDriver::with_config(config(200.0));
        let (action, hits) = counter();
        driver.subscribe(action.clone()).unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        driver.unsubscribe(&action);
        driver.request_stop().wait().await;

        assert_eq!(driver.phase(), Phase::Stopped);
        assert_eq!(driver.subscriber_count(), 0);
        assert!(hits.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn relaunch_after_drain_recreates_backing() {
        let driver = IntervalDriver::with_config(config(200.0));
        let (first, first_hits) = counter();

        driver.subscribe(first.clone()).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        driver.unsubscribe(&first);
        driver.request_stop().wait().await;
        assert_eq!(driver.phase(), Phase::Stopped);

        let (second, second_hits) = counter();
        driver.subscribe(second.clone()).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(first_hits.load(Ordering::SeqCst) >= 1);
        assert!(second_hits.load(Ordering::SeqCst) >= 1);
        driver.request_stop().wait().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn panicking_subscriber_does_not_kill_the_loop() {
        let driver = IntervalDriver::with_config(config(200.0));
        let (good, hits) = counter();
        let bad = ActionFn::arc("bad", || panic!("subscriber blew up"));

        driver.subscribe(bad.clone()).unwrap();
        driver.subscribe(good.clone()).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(hits.load(Ordering::SeqCst) >= 2, "loop must keep cycling");
        driver.request_stop().wait().await;
    }

    /// A gate action that blocks each invocation until the test releases it,
    /// making mid-invoke-phase timing deterministic.
    fn gate() -> (ActionRef, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        // Mutex-wrapped because mpsc endpoints are not Sync.
        let entered_tx = Mutex::new(entered_tx);
        let release_rx = Mutex::new(release_rx);
        let action = ActionFn::arc("gate", move || {
            entered_tx
                .lock()
                .expect("gate lock")
                .send(())
                .expect("test listener alive");
            release_rx
                .lock()
                .expect("gate lock")
                .recv()
                .expect("test releaser alive");
        });
        (action, entered_rx, release_tx)
    }

    const STEP: Duration = Duration::from_secs(5);

    #[tokio::test(flavor = "multi_thread")]
    async fn mid_invoke_unsubscribe_is_deferred_to_next_cycle() {
        let driver =
            IntervalDriver::with_config(config(200.0).with_backing(Backing::Thread));
        let (gate_action, entered, release) = gate();
        let (x, hits) = counter();

        // Cycle 1: only the gate is active, and it is blocked mid-invoke.
        driver.subscribe(gate_action.clone()).unwrap();
        entered.recv_timeout(STEP).unwrap();

        // Parked while the cycle owns the set; visible to is_subscribed at once.
        driver.subscribe(x.clone()).unwrap();
        assert!(driver.is_subscribed(&x));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        release.send(()).unwrap();

        // Cycle 2: x drained in, part of the snapshot; unsubscribe mid-invoke.
        entered.recv_timeout(STEP).unwrap();
        driver.unsubscribe(&x);
        assert!(!driver.is_subscribed(&x));
        release.send(()).unwrap();

        // Cycles 3 and 4: x was drained out, but its cycle-2 invocation stands.
        entered.recv_timeout(STEP).unwrap();
        release.send(()).unwrap();
        entered.recv_timeout(STEP).unwrap();
        release.send(()).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);

        driver.unsubscribe(&gate_action);
        let _ = release.send(());
        driver.request_stop().wait().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn balanced_deferred_ops_leave_membership_unchanged() {
        let driver =
            IntervalDriver::with_config(config(200.0).with_backing(Backing::Thread));
        let (gate_action, entered, release) = gate();
        let (x, _) = counter();

        driver.subscribe(gate_action.clone()).unwrap();
        entered.recv_timeout(STEP).unwrap();

        driver.subscribe(x.clone()).unwrap();
        driver.unsubscribe(&x);
        driver.subscribe(x.clone()).unwrap();
        driver.unsubscribe(&x);
        assert!(!driver.is_subscribed(&x));
        release.send(()).unwrap();

        entered.recv_timeout(STEP).unwrap();
        assert_eq!(driver.subscriber_count(), 1);
        release.send(()).unwrap();

        driver.unsubscribe(&gate_action);
        let _ = release.send(());
        driver.request_stop().wait().await;
    }
}
