//! # Backing contexts for the cycle loop.
//!
//! A driver owns exactly one background execution context. [`Runner`]
//! hides which kind behind a single `spawn` operation:
//!
//! - [`Backing::Pooled`] — a task on the ambient tokio worker pool;
//! - [`Backing::LongRunning`] — a blocking-pool thread driving the loop on
//!   its own current-thread runtime, so it never occupies an async worker;
//! - [`Backing::Thread`] — a dedicated OS thread, same local runtime.
//!
//! A finished or faulted context is never restarted in place; the driver
//! simply spawns a fresh one on the next launch. The runtime handle is
//! captured at driver construction so pooled backings can be launched from
//! foreign (non-runtime) threads.

use std::future::Future;

use tokio::runtime::Handle;

use crate::config::Backing;

/// Spawns the cycle loop on the configured backing context.
pub(crate) struct Runner {
    backing: Backing,
    handle: Option<Handle>,
}

impl Runner {
    /// Captures the ambient runtime (if any) for later spawns.
    pub fn new(backing: Backing) -> Self {
        Self {
            backing,
            handle: Handle::try_current().ok(),
        }
    }

    /// Spawns `cycle` on the backing context.
    ///
    /// Returns `false` if no context could be created (no ambient runtime
    /// for a pooled backing, or OS thread creation failed); the future was
    /// dropped un-polled in that case.
    pub fn spawn<F>(&self, label: &str, cycle: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.backing {
            Backing::Pooled => match &self.handle {
                Some(handle) => {
                    handle.spawn(cycle);
                    true
                }
                None => {
                    log::error!("{label}: pooled backing requires an ambient tokio runtime");
                    false
                }
            },
            Backing::LongRunning => match &self.handle {
                Some(handle) => {
                    handle.spawn_blocking(move || block_on_local(cycle));
                    true
                }
                None => {
                    log::error!("{label}: long-running backing requires an ambient tokio runtime");
                    false
                }
            },
            Backing::Thread => {
                let spawned = std::thread::Builder::new()
                    .name(label.to_string())
                    .spawn(move || block_on_local(cycle));
                match spawned {
                    Ok(_) => true,
                    Err(e) => {
                        log::error!("{label}: failed to spawn cycle thread: {e}");
                        false
                    }
                }
            }
        }
    }
}

/// Drives an async cycle loop to completion on a thread of our own.
fn block_on_local<F: Future<Output = ()>>(cycle: F) {
    match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(rt) => rt.block_on(cycle),
        Err(e) => log::error!("failed to build cycle-loop runtime: {e}"),
    }
}
