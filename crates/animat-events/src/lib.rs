//! Shared event and snapshot types for the animat simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! The engine produces these records; recorders, loggers and analysis
//! tooling consume them.

pub mod event;
pub mod snapshot;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

// Re-export event types
pub use event::{EventKind, EventType, GridPos, SimEvent};

// Re-export snapshot types
pub use snapshot::{
    generate_frame_id, AnimatSnapshot, FrameSnapshot, RunManifest, RunSummary,
};
