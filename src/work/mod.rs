//! # Units of work a driver can cycle.
//!
//! This module provides the capability traits a caller registers with a
//! driver, and the shared-handle types used as subscriber tokens:
//! - [`Token`] — identity contract every registered handle satisfies
//! - [`Action`] / [`ActionFn`] / [`ActionRef`] — zero-argument callable
//! - [`Step`] / [`StepRef`] — stateful object driven via `step()`
//! - [`Transform`] / [`TransformFn`] / [`TransformRef`] — barrier
//!   state-transform over a shared 64-bit word
//!
//! A driver never interprets what a unit of work does; it only needs the
//! invokable capability and a stable identity to manage membership.

mod action;
mod step;
mod token;
mod transform;

pub use action::{Action, ActionFn, ActionRef};
pub use step::{Step, StepRef};
pub use token::Token;
pub use transform::{Transform, TransformFn, TransformRef};
