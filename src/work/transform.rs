//! # Barrier state transforms.
//!
//! A [`BarrierDriver`](crate::BarrierDriver) subscriber is a pure-ish
//! function over the shared 64-bit barrier word: it receives the current
//! word and returns the next one. Each subscriber owns one private bit; a
//! round completes when every subscriber's bit is set.
//!
//! [`Transform`] is the capability trait, [`TransformFn`] the closure-backed
//! implementation, [`TransformRef`] the shared-handle token.

use std::borrow::Cow;
use std::sync::Arc;

/// # State transform over the shared barrier word.
///
/// Invoked each cycle until the subscriber's assigned bit is set in the
/// word it returns. Setting the bit is how a transform reports "done for
/// this round"; the driver does not set it on the transform's behalf.
pub trait Transform: Send + Sync + 'static {
    /// Applies this transform to the current barrier word, returning the
    /// next word.
    fn apply(&self, state: u64) -> u64;

    /// Diagnostic name used in fault events and logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a transform; the subscriber token of barrier drivers.
pub type TransformRef = Arc<dyn Transform>;

/// Function-backed transform implementation.
///
/// ## Example
/// ```
/// use paceline::{Transform, TransformFn, TransformRef};
///
/// // Sets bit 3 once the low byte is non-zero.
/// let t: TransformRef = TransformFn::arc("gate", |state: u64| {
///     if state & 0xFF != 0 { state | (1 << 3) } else { state }
/// });
/// assert_eq!(t.apply(0x01), 0x09);
/// ```
pub struct TransformFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TransformFn<F> {
    /// Creates a new function-backed transform.
    ///
    /// Prefer [`TransformFn::arc`] when you immediately need a
    /// [`TransformRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F: Fn(u64) -> u64 + Send + Sync + 'static> TransformFn<F> {
    /// Creates the transform and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> TransformRef {
        Arc::new(Self::new(name, f))
    }
}

impl<F: Fn(u64) -> u64 + Send + Sync + 'static> Transform for TransformFn<F> {
    fn apply(&self, state: u64) -> u64 {
        (self.f)(state)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
