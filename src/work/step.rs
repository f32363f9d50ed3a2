//! # Steppable objects.
//!
//! [`Step`] is the capability a controller-style object exposes to a
//! [`StepDriver`](crate::StepDriver): no delegate indirection, the driver
//! calls `step()` on the object itself once per cycle.
//!
//! Implementors are stateful by nature; mutation happens through interior
//! mutability (`Mutex`, atomics), since the driver shares the handle with
//! the owning component. Whatever `step()` does — polling a pin address,
//! advancing a state machine — is the collaborator's business; the driver
//! never interprets it.

use std::sync::Arc;

/// # Stateful object driven by repeated `step()` calls.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use paceline::Step;
///
/// struct Axis {
///     position: AtomicU32,
/// }
///
/// impl Step for Axis {
///     fn step(&self) {
///         self.position.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait Step: Send + Sync + 'static {
    /// Advances this object by one step.
    ///
    /// Failures inside `step()` are the implementor's responsibility; a
    /// panic is caught by the driver and reported once, and the cycle
    /// continues with the next object.
    fn step(&self);

    /// Diagnostic name used in fault events and logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a steppable object; the subscriber token of step drivers.
pub type StepRef = Arc<dyn Step>;
