//! # Deferred mutation queue.
//!
//! While a cycle owns the active set (drain or invoke phase), subscribe and
//! unsubscribe requests are parked here and applied in FIFO order at the
//! next drain phase. This is what makes concurrent membership mutation safe
//! without ever exposing a half-iterated set.
//!
//! Three operation kinds exist because the driver variants defer
//! differently:
//! - interval and barrier drivers enqueue directed [`PendingOp::Add`] /
//!   [`PendingOp::Remove`];
//! - the step driver enqueues [`PendingOp::Toggle`] (add-if-absent, else
//!   remove).

use std::collections::VecDeque;

use crate::core::members::MemberSet;
use crate::work::Token;

/// One parked membership mutation.
#[derive(Clone)]
pub enum PendingOp<T> {
    /// Insert the token (no-op if present).
    Add(T),
    /// Remove the token (no-op if absent).
    Remove(T),
    /// Insert if absent, remove if present.
    Toggle(T),
}

impl<T> PendingOp<T> {
    fn token(&self) -> &T {
        match self {
            PendingOp::Add(t) | PendingOp::Remove(t) | PendingOp::Toggle(t) => t,
        }
    }
}

/// FIFO of deferred membership mutations for one driver.
pub struct PendingQueue<T> {
    ops: VecDeque<PendingOp<T>>,
}

impl<T: Token> PendingQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            ops: VecDeque::new(),
        }
    }

    /// Parks one mutation.
    pub fn push(&mut self, op: PendingOp<T>) {
        self.ops.push_back(op);
    }

    /// True if nothing is parked.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Applies every parked mutation to `members` in FIFO order and clears
    /// the queue.
    pub fn apply(&mut self, members: &mut MemberSet<T>) {
        while let Some(op) = self.ops.pop_front() {
            match op {
                PendingOp::Add(t) => members.add(t),
                PendingOp::Remove(t) => members.remove(&t),
                PendingOp::Toggle(t) => {
                    if members.contains(&t) {
                        members.remove(&t);
                    } else {
                        members.add(t);
                    }
                }
            }
        }
    }

    /// Folds the queue over a membership answer without applying anything.
    ///
    /// Given whether `token` is currently in the set, returns whether it
    /// will be after the next drain phase. Used to answer `is_subscribed`
    /// accurately while mutations are parked.
    pub fn effect_on(&self, token: &T, currently: bool) -> bool {
        self.ops.iter().fold(currently, |member, op| {
            if !op.token().same(token) {
                return member;
            }
            match op {
                PendingOp::Add(_) => true,
                PendingOp::Remove(_) => false,
                PendingOp::Toggle(_) => !member,
            }
        })
    }
}

impl<T: Token> Default for PendingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    type Tok = Arc<u32>;

    #[test]
    fn applies_in_fifo_order() {
        let mut q: PendingQueue<Tok> = PendingQueue::new();
        let mut set = MemberSet::new();
        let t = Arc::new(1);
        q.push(PendingOp::Add(t.clone()));
        q.push(PendingOp::Remove(t.clone()));
        q.push(PendingOp::Add(t.clone()));
        q.apply(&mut set);
        assert!(set.contains(&t));
        assert!(q.is_empty());
    }

    #[test]
    fn balanced_ops_leave_membership_unchanged() {
        let mut q: PendingQueue<Tok> = PendingQueue::new();
        let mut set = MemberSet::new();
        let present = Arc::new(1);
        let absent = Arc::new(2);
        set.add(present.clone());

        for _ in 0..3 {
            q.push(PendingOp::Remove(present.clone()));
            q.push(PendingOp::Add(present.clone()));
            q.push(PendingOp::Add(absent.clone()));
            q.push(PendingOp::Remove(absent.clone()));
        }
        q.apply(&mut set);
        assert!(set.contains(&present));
        assert!(!set.contains(&absent));
    }

    #[test]
    fn balanced_toggles_leave_membership_unchanged() {
        let mut q: PendingQueue<Tok> = PendingQueue::new();
        let mut set = MemberSet::new();
        let t = Arc::new(1);
        set.add(t.clone());
        q.push(PendingOp::Toggle(t.clone()));
        q.push(PendingOp::Toggle(t.clone()));
        q.apply(&mut set);
        assert!(set.contains(&t));
    }

    #[test]
    fn effect_on_folds_without_applying() {
        let mut q: PendingQueue<Tok> = PendingQueue::new();
        let t = Arc::new(1);
        let other = Arc::new(2);
        assert!(!q.effect_on(&t, false));

        q.push(PendingOp::Add(t.clone()));
        assert!(q.effect_on(&t, false));
        assert!(!q.effect_on(&other, false));

        q.push(PendingOp::Remove(t.clone()));
        assert!(!q.effect_on(&t, false));

        q.push(PendingOp::Toggle(t.clone()));
        assert!(q.effect_on(&t, false));
        assert!(!q.is_empty());
    }
}
