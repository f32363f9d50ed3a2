//! # Action abstraction and function-backed implementation.
//!
//! This module defines the [`Action`] trait (a zero-argument unit of work
//! invoked once per cycle) and a convenient closure-backed implementation
//! [`ActionFn`]. The common handle type is [`ActionRef`], an
//! `Arc<dyn Action>` suitable for registering with a driver.
//!
//! An action is invoked from the driver's cycle loop; it should return
//! promptly — a blocking action stretches every subscriber's cycle on the
//! same driver.

use std::borrow::Cow;
use std::sync::Arc;

/// # Zero-argument unit of work.
///
/// An `Action` has a diagnostic [`name`](Action::name) and a [`call`](Action::call)
/// method the driver invokes once per cycle while the action is subscribed.
///
/// # Example
/// ```
/// use paceline::Action;
///
/// struct Beep;
///
/// impl Action for Beep {
///     fn call(&self) {
///         // do work...
///     }
///
///     fn name(&self) -> &str { "beep" }
/// }
/// ```
pub trait Action: Send + Sync + 'static {
    /// Executes one invocation of this action.
    fn call(&self);

    /// Diagnostic name used in fault events and logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to an action; the subscriber token of interval drivers.
pub type ActionRef = Arc<dyn Action>;

/// Function-backed action implementation.
///
/// Wraps a `Fn()` closure. State shared with the caller goes through an
/// explicit `Arc` captured by the closure.
///
/// ## Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use paceline::{ActionFn, ActionRef};
///
/// let hits = Arc::new(AtomicU64::new(0));
/// let counted = Arc::clone(&hits);
/// let tick: ActionRef = ActionFn::arc("tick", move || {
///     counted.fetch_add(1, Ordering::Relaxed);
/// });
/// tick.call();
/// assert_eq!(hits.load(Ordering::Relaxed), 1);
/// ```
pub struct ActionFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ActionFn<F> {
    /// Creates a new function-backed action.
    ///
    /// Prefer [`ActionFn::arc`] when you immediately need an [`ActionRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F: Fn() + Send + Sync + 'static> ActionFn<F> {
    /// Creates the action and returns it as a shared handle (`Arc<dyn Action>`).
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> ActionRef {
        Arc::new(Self::new(name, f))
    }
}

impl<F: Fn() + Send + Sync + 'static> Action for ActionFn<F> {
    fn call(&self) {
        (self.f)()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
