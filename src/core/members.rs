//! # Membership container for active subscribers.
//!
//! [`MemberSet`] holds the tokens a driver invokes each cycle. It is a set
//! keyed by token identity ([`Token::same`]): at most one occurrence of a
//! given token, insertion order irrelevant.
//!
//! Two optional external hooks (`on_add`, `on_remove`) are invoked
//! synchronously whenever membership is mutated through [`MemberSet::add`]
//! or [`MemberSet::remove`] — *before* the mutation, and regardless of
//! whether the call ends up changing membership (hooks observe requests,
//! not outcomes). [`MemberSet::replace_all`] bypasses hooks: it exists for
//! bulk resynchronization, e.g. clearing the set when a driver stops.
//!
//! The set is `Vec`-backed: driver subscriber counts are small, and a
//! linear identity scan beats hashing opaque handles.

use crate::work::Token;

/// External membership hook; receives the token being added or removed.
pub type MemberHook<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Identity-keyed set of subscriber tokens with external mutation hooks.
pub struct MemberSet<T> {
    items: Vec<T>,
    on_add: Option<MemberHook<T>>,
    on_remove: Option<MemberHook<T>>,
}

impl<T: Token> MemberSet<T> {
    /// Creates an empty set with no hooks.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            on_add: None,
            on_remove: None,
        }
    }

    /// Installs the add/remove hooks, replacing any previous pair.
    pub fn set_hooks(&mut self, on_add: MemberHook<T>, on_remove: MemberHook<T>) {
        self.on_add = Some(on_add);
        self.on_remove = Some(on_remove);
    }

    /// Adds `token` to the set. No-op if an identical token is present.
    ///
    /// The `on_add` hook (if set) fires before the mutation.
    pub fn add(&mut self, token: T) {
        if let Some(hook) = &self.on_add {
            hook(&token);
        }
        if !self.contains(&token) {
            self.items.push(token);
        }
    }

    /// Removes `token` from the set. No-op if absent.
    ///
    /// The `on_remove` hook (if set) fires before the mutation.
    pub fn remove(&mut self, token: &T) {
        if let Some(hook) = &self.on_remove {
            hook(token);
        }
        self.items.retain(|t| !t.same(token));
    }

    /// True if an identical token is a member.
    pub fn contains(&self, token: &T) -> bool {
        self.items.iter().any(|t| t.same(token))
    }

    /// Replaces the entire membership, bypassing hooks.
    ///
    /// Duplicates in `tokens` are dropped (first occurrence wins).
    pub fn replace_all(&mut self, tokens: Vec<T>) {
        self.items.clear();
        for token in tokens {
            if !self.contains(&token) {
                self.items.push(token);
            }
        }
    }

    /// Clones the current membership for one cycle's invoke phase.
    ///
    /// The returned order is unspecified but stable for the lifetime of
    /// the snapshot.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.clone()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if there are no members.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Token> Default for MemberSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
