//! Concrete driver variants.
//!
//! Each variant is the generic [`Driver`](crate::Driver) instantiated with
//! an element type and an invocation strategy:
//!
//! | Variant | Element | Invoke phase | Deferred op |
//! |---|---|---|---|
//! | [`IntervalDriver`] | [`ActionRef`](crate::ActionRef) | `action.call()` | directed add/remove |
//! | [`BarrierDriver`] | [`TransformRef`](crate::TransformRef) | `state = f.apply(state)` until every bit is set | directed add/remove |
//! | [`StepDriver`] | [`StepRef`](crate::StepRef) | `object.step()` | toggle |

mod barrier;
mod interval;
mod stepper;

pub use barrier::{BarrierCycle, BarrierDriver};
pub use interval::{IntervalCycle, IntervalDriver};
pub use stepper::{StepCycle, StepDriver};
