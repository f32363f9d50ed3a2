//! # Step driver: advance stateful objects, once per cycle.
//!
//! Subscribers are objects exposing a [`Step`](crate::Step) capability; the
//! invoke phase calls `step()` on each instead of going through a delegate.
//!
//! Deferral works differently from the other variants: mutations parked
//! while a cycle owns the set are **toggles** (add-if-absent, else remove),
//! not directed add/remove ops — a parked `subscribe` of a member removes
//! it, and vice versa.

use crate::config::DriverConfig;
use crate::core::{CycleReport, Driver, OpKind, PendingOp, Strategy, invoke_guarded};
use crate::events::Bus;
use crate::work::StepRef;

/// Invocation strategy of the step driver: direct `step()` calls, toggle
/// deferral.
#[derive(Default)]
pub struct StepCycle;

impl Strategy<StepRef> for StepCycle {
    fn defer(&self, token: StepRef, _requested: OpKind) -> PendingOp<StepRef> {
        PendingOp::Toggle(token)
    }

    fn run_cycle(&self, snapshot: &[StepRef], bus: &Bus) -> CycleReport {
        for object in snapshot {
            invoke_guarded(bus, object.name(), || object.step());
        }
        CycleReport::invoked(snapshot.len())
    }
}

/// Periodic driver stepping stateful objects.
pub type StepDriver = Driver<StepRef, StepCycle>;

impl StepDriver {
    /// Creates a step driver from the given config.
    pub fn with_config(config: DriverConfig) -> Self {
        Driver::new(config, StepCycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Backing, Rate};
    use crate::work::Step;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, mpsc};
    use std::time::Duration;

    fn config(rate: f64) -> DriverConfig {
        DriverConfig::at_rate(Rate::per_sec(rate).unwrap())
    }

    struct Axis {
        steps: AtomicUsize,
    }

    impl Step for Axis {
        fn step(&self) {
            self.steps.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &str {
            "axis"
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn objects_are_stepped_each_cycle() {
        let driver = StepDriver::with_config(config(100.0));
        let axis = Arc::new(Axis {
            steps: AtomicUsize::new(0),
        });
        let token: StepRef = axis.clone();

        driver.subscribe(token.clone()).unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        driver.unsubscribe(&token);
        driver.request_stop().wait().await;

        assert!(axis.steps.load(Ordering::SeqCst) >= 2);
    }

    /// Gate object blocking each step until released, to pin the invoke phase.
    struct GateStep {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl Step for GateStep {
        fn step(&self) {
            self.entered
                .lock()
                .expect("gate lock")
                .send(())
                .expect("test listener alive");
            self.release
                .lock()
                .expect("gate lock")
                .recv()
                .expect("test releaser alive");
        }

        fn name(&self) -> &str {
            "gate"
        }
    }

    const STEP: Duration = Duration::from_secs(5);

    #[tokio::test(flavor = "multi_thread")]
    async fn parked_mutations_toggle_membership() {
        let driver = StepDriver::with_config(config(200.0).with_backing(Backing::Thread));
        let (entered_tx, entered) = mpsc::channel();
        let (release, release_rx) = mpsc::channel();
        let gate: StepRef = Arc::new(GateStep {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let axis = Arc::new(Axis {
            steps: AtomicUsize::new(0),
        });
        let token: StepRef = axis.clone();

        driver.subscribe(gate.clone()).unwrap();
        entered.recv_timeout(STEP).unwrap();

        // Two parked subscribes of the same absent token: toggle in, toggle
        // back out — net effect nothing.
        driver.subscribe(token.clone()).unwrap();
        assert!(driver.is_subscribed(&token));
        driver.subscribe(token.clone()).unwrap();
        assert!(!driver.is_subscribed(&token));
        release.send(()).unwrap();

        entered.recv_timeout(STEP).unwrap();
        assert_eq!(driver.subscriber_count(), 1);
        assert_eq!(axis.steps.load(Ordering::SeqCst), 0);
        release.send(()).unwrap();

        driver.unsubscribe(&gate);
        let _ = release.send(());
        driver.request_stop().wait().await;
    }
}
