//! # Simple logging observer for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [launched]
//! [cycle] active=3
//! [barrier-cleared] state=0x000000000000000b
//! [subscriber-panicked] name=ticker reason="boom"
//! [drained]
//! [stop-requested]
//! [stopped]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Observe;

/// Simple stdout logging observer.
///
/// Prints human-readable event descriptions for debugging and
/// demonstration purposes. Not intended for production — implement a
/// custom [`Observe`] for structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::CycleFinished => {
                println!("[cycle] active={:?}", e.active);
            }
            EventKind::Drained => {
                println!("[drained]");
            }
            EventKind::BarrierCleared => {
                println!("[barrier-cleared] state={:#018x}", e.state.unwrap_or(0));
            }
            EventKind::Launched => {
                println!("[launched]");
            }
            EventKind::StopRequested => {
                println!("[stop-requested]");
            }
            EventKind::Stopped => {
                println!("[stopped]");
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] name={:?} reason={:?}",
                    e.subscriber, e.reason
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
