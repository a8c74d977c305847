//! Trial order construction and traversal.
//!
//! [`SequenceBuilder`] turns a loop shape into a [`SequenceMatrix`];
//! [`TrialCursor`] walks that matrix one trial at a time.

pub mod cursor;
mod sequence;
mod sink;

pub use cursor::{CursorSnapshot, CursorState, Step, TrialCursor, DEFAULT_NAME};
pub use sequence::{SequenceBuilder, SequenceMatrix};
pub use sink::{DataSink, MemorySink};
