//! Output
//!
//! Frame recorders and the end-of-run summary.

pub mod recorder;
pub mod summary;

pub use recorder::{build_frame, FrameRecorder, FrameSink, JsonlRecorder, MemoryRecorder, NullRecorder};
pub use summary::{finalize_summary, tally_events};
