//! # ObserverSet: non-blocking fan-out over multiple observers.
//!
//! [`ObserverSet`] distributes each [`Event`] to multiple observers
//! **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-observer FIFO (queue order).
//! - Panics inside observers are caught and logged (isolation).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different observers.
//! - No retries on per-observer queue overflow (events are dropped for
//!   that observer).

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event};

use super::Observe;

/// Per-observer channel with metadata.
struct ObserverChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-observer bounded queues and worker tasks.
pub struct ObserverSet {
    channels: Vec<ObserverChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl ObserverSet {
    /// Creates a new set and spawns one worker per observer.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn Observe>>) -> Self {
        let mut channels = Vec::with_capacity(observers.len());
        let mut workers = Vec::with_capacity(observers.len());

        for observer in observers {
            let cap = observer.queue_capacity().max(1);
            let name = observer.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let o = Arc::clone(&observer);

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = o.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await
                    {
                        log::warn!("observer '{}' panicked: {:?}", o.name(), panic_err);
                    }
                }
            });

            channels.push(ObserverChannel { name, sender: tx });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fans one event out to all observers (non-blocking).
    ///
    /// If an observer's queue is **full** or **closed**, the event is
    /// dropped for it and a warning is logged with the observer's name.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("observer '{}' dropped event: queue full", channel.name);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::warn!("observer '{}' dropped event: worker closed", channel.name);
                }
            }
        }
    }

    /// Subscribes to `bus` and forwards every event to this set until the
    /// returned token is cancelled (or the bus closes).
    ///
    /// Typical wiring for a driver:
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use paceline::{DriverConfig, IntervalDriver, LogWriter, Observe, ObserverSet, Rate};
    /// # let driver = IntervalDriver::with_config(DriverConfig::at_rate(Rate::per_sec(10.0).unwrap()));
    /// let observers: Vec<Arc<dyn Observe>> = vec![Arc::new(LogWriter)];
    /// let set = Arc::new(ObserverSet::new(observers));
    /// let stop_listening = set.attach(driver.bus());
    /// # let _ = stop_listening;
    /// ```
    pub fn attach(self: &Arc<Self>, bus: Bus) -> CancellationToken {
        let token = CancellationToken::new();
        let stop = token.clone();
        let set = Arc::clone(self);
        // Subscribe before spawning so events published right after attach
        // returns are not missed.
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            log::warn!("observer listener lagged, skipped {n} events");
                        }
                    },
                }
            }
        });
        token
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for handle in self.workers {
            let _ = handle.await;
        }
    }

    /// True if there are no observers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counter {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl Observe for Counter {
        async fn on_event(&self, _event: &Event) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &'static str {
            "counter"
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn events_reach_every_observer() {
        let counter = Arc::new(Counter {
            seen: AtomicUsize::new(0),
        });
        let set = Arc::new(ObserverSet::new(vec![
            counter.clone() as Arc<dyn Observe>
        ]));

        let bus = Bus::new(16);
        let listener = set.attach(bus.clone());

        bus.publish(Event::now(EventKind::CycleFinished).with_active(1));
        bus.publish(Event::now(EventKind::Drained));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.seen.load(Ordering::SeqCst), 2);
        listener.cancel();
    }
}
