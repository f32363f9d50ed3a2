//! # Subscriber token identity.
//!
//! A registered unit of work is tracked by **reference identity**, never by
//! value: two closures that happen to do the same thing are two different
//! subscribers, and the same `Arc` handle subscribed twice is one.
//!
//! [`Token`] is the contract the membership machinery needs: cheap clone
//! plus an identity comparison. The blanket impl covers every `Arc<T>`,
//! including trait objects ([`ActionRef`](crate::ActionRef),
//! [`StepRef`](crate::StepRef), [`TransformRef`](crate::TransformRef)),
//! comparing payload addresses and ignoring vtable metadata.

use std::sync::Arc;

/// Identity-comparable subscriber handle.
///
/// ## Rules
/// - `same` must be reflexive and must only depend on *which* object the
///   handle refers to, not on its value.
/// - Cloning must preserve identity (`a.same(&a.clone())`).
pub trait Token: Clone + Send + Sync + 'static {
    /// True if both handles refer to the same underlying object.
    fn same(&self, other: &Self) -> bool;
}

impl<T: ?Sized + Send + Sync + 'static> Token for Arc<T> {
    fn same(&self, other: &Self) -> bool {
        // addr_eq ignores vtable metadata; Arc::ptr_eq on trait objects
        // can report false for the same allocation across codegen units.
        std::ptr::addr_eq(Arc::as_ptr(self), Arc::as_ptr(other))
    }
}
