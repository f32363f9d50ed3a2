//! # Driver lifecycle phases.
//!
//! One named state per distinct situation the cycle loop can be in. The
//! phase is a cooperative signal, not a lock: it tells caller-facing
//! operations whether the cycle loop currently owns the active set (in
//! which case mutations go through the deferred queue) and whether the
//! backing context needs to be (re)created on launch.

/// Lifecycle/phase indicator of a driver.
///
/// ```text
/// Idle ──launch──► Running ◄──┐
///                    │        │ (between phases of one cycle)
///                    ├─► Draining ──┘
///                    ├─► Iterating ─┘
///                    ├─► Stopping ──► Stopped ──launch──► Idle
///                    └─────────────► Stopped  (drained)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No backing context is executing; the active set may be mutated
    /// directly by callers' subscribe/unsubscribe.
    Idle,
    /// The cycle loop is alive, between drain and invoke work.
    Running,
    /// The cycle loop is applying the deferred mutation queue.
    Draining,
    /// The cycle loop is invoking the cycle's snapshot of subscribers.
    Iterating,
    /// A stop was requested; the current cycle finishes, then the loop exits.
    Stopping,
    /// The cycle loop has exited and the active set was cleared.
    Stopped,
}

impl Phase {
    /// True while a cycle owns the active set: mutations issued now must be
    /// deferred to the next cycle boundary.
    #[inline]
    pub fn cycle_owns_set(self) -> bool {
        matches!(self, Phase::Draining | Phase::Iterating)
    }

    /// True while the backing context is (or is about to be) executing the
    /// cycle loop.
    #[inline]
    pub fn is_live(self) -> bool {
        !matches!(self, Phase::Idle | Phase::Stopped)
    }
}
