//! # Barrier driver: cycle until every subscriber's bit is set.
//!
//! Subscribers are state transforms over a shared 64-bit word. Each one is
//! assigned a private bit at registration (lowest unused index). During the
//! invoke phase a transform whose bit is still clear receives the current
//! word and returns the next one; it reports completion by setting its bit.
//! Transforms whose bit is already set are counted done without being
//! invoked again that round.
//!
//! When every subscriber of a cycle is done, [`EventKind::BarrierCleared`]
//! (carrying the final word) is published; a one-shot driver then halts,
//! otherwise the word resets to zero and the next round begins.
//!
//! The bit table and the shared word live behind the strategy's own lock,
//! held only around lookups and updates — a transform runs without it, so
//! `is_subscribed` waits for at most one table access, never for a whole
//! invoke phase.
//!
//! ## Capacity
//! The word has 64 bits, so at most 64 concurrent subscribers: the 65th
//! registration fails with [`SubscribeError::BarrierFull`] and is not
//! registered at all.
//!
//! [`EventKind::BarrierCleared`]: crate::EventKind::BarrierCleared
//! [`SubscribeError::BarrierFull`]: crate::SubscribeError::BarrierFull

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::DriverConfig;
use crate::core::{CycleReport, Driver, Strategy, invoke_guarded};
use crate::error::SubscribeError;
use crate::events::{Bus, Event, EventKind};
use crate::work::{Token, TransformRef};

/// Number of bits in the shared word; the subscriber capacity.
const SLOTS: usize = 64;

/// Bit assignments plus the shared word, guarded together.
struct BarrierState {
    assignments: Vec<(TransformRef, u64)>,
    word: u64,
}

impl BarrierState {
    fn mask_of(&self, token: &TransformRef) -> Option<u64> {
        self.assignments
            .iter()
            .find(|(t, _)| t.same(token))
            .map(|(_, mask)| *mask)
    }
}

/// Invocation strategy of the barrier driver.
pub struct BarrierCycle {
    state: Mutex<BarrierState>,
    one_shot: bool,
}

impl BarrierCycle {
    /// Creates the strategy. `one_shot` halts the driver after the first
    /// cleared round instead of resetting the word.
    pub fn new(one_shot: bool) -> Self {
        Self {
            state: Mutex::new(BarrierState {
                assignments: Vec::new(),
                word: 0,
            }),
            one_shot,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BarrierCycle {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Strategy<TransformRef> for BarrierCycle {
    /// Assigns the lowest unused bit. Re-registering a known transform
    /// keeps its bit.
    fn reserve(&self, token: &TransformRef) -> Result<(), SubscribeError> {
        let mut state = self.lock();
        if state.mask_of(token).is_some() {
            return Ok(());
        }
        let reserved = state
            .assignments
            .iter()
            .fold(0u64, |acc, (_, mask)| acc | mask);
        let free = (!reserved).trailing_zeros() as usize;
        if free >= SLOTS {
            return Err(SubscribeError::BarrierFull { limit: SLOTS });
        }
        state.assignments.push((token.clone(), 1u64 << free));
        Ok(())
    }

    /// Reclaims the bit immediately, even when the membership removal is
    /// deferred to the next drain.
    fn release(&self, token: &TransformRef) {
        self.lock().assignments.retain(|(t, _)| !t.same(token));
    }

    /// The assignment table is the authoritative registration answer.
    fn contains(&self, token: &TransformRef) -> Option<bool> {
        Some(self.lock().mask_of(token).is_some())
    }

    fn run_cycle(&self, snapshot: &[TransformRef], bus: &Bus) -> CycleReport {
        let mut invoked = 0;
        let mut done = 0;

        for transform in snapshot {
            // Table lookup under the lock; the transform runs without it.
            // Only this loop writes the word, so the read-invoke-write
            // sequence cannot lose an update.
            let (mask, current) = {
                let state = self.lock();
                (state.mask_of(transform), state.word)
            };
            let Some(mask) = mask else {
                // Deregistered mid-cycle: bit already reclaimed, membership
                // leaves at the next drain. Nothing left for it to do.
                done += 1;
                continue;
            };
            if current & mask == 0 {
                invoked += 1;
                if let Some(next) =
                    invoke_guarded(bus, transform.name(), || transform.apply(current))
                {
                    self.lock().word = next;
                    if next & mask != 0 {
                        done += 1;
                    }
                }
            } else {
                done += 1;
            }
        }

        if done == snapshot.len() {
            let mut state = self.lock();
            bus.publish(Event::now(EventKind::BarrierCleared).with_state(state.word));
            if self.one_shot {
                return CycleReport {
                    invoked,
                    halt: true,
                };
            }
            state.word = 0;
        }
        CycleReport::invoked(invoked)
    }
}

/// Barrier-synchronized periodic driver.
pub type BarrierDriver = Driver<TransformRef, BarrierCycle>;

impl BarrierDriver {
    /// Creates a barrier driver from the given config.
    pub fn with_config(config: DriverConfig, one_shot: bool) -> Self {
        Driver::new(config, BarrierCycle::new(one_shot))
    }
}
