//! Event Logging
//!
//! Per-tick event buffering and the JSONL log they are flushed into.

pub mod logger;

pub use logger::{EventLog, TickEvents};
