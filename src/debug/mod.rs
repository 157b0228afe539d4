//! Diagnostic tracing of machine execution.
//!
//! A machine carries a bitmask selecting which kinds of step-by-step trace
//! lines it produces, and a sink receiving them. Tracing is a pass-through
//! facility: it never influences the algorithm.

mod flags;
mod sink;

pub use flags::{DebugFlags, ParseDebugFlagsError, DEBUG_ENV_VAR};
pub use sink::{DebugSink, JsonLinesSink, RecordingSink, StderrSink, TraceLine, TracingSink};
