#![forbid(unsafe_code)]

//! Shared foundations for the chipline widgets: canonical input events,
//! geometric primitives, and tick-driven countdown timers.
//!
//! Nothing in this crate reads the wall clock or touches a terminal by
//! itself; hosts feed events in (optionally converted from crossterm) and
//! advance time explicitly, which keeps every downstream state machine
//! deterministic under test.

pub mod event;
pub mod geometry;
pub mod logging;
pub mod timer;

// With the feature on, the tracing macros live at the crate root so call
// sites use one path regardless of the feature state (the no-op stand-ins
// in `logging` are exported at the root too).
#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, trace, trace_span, warn};
