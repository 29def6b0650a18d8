//! Sample data fixtures for testing.
//!
//! This module provides ready-made test data for other crates to use.
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // animat-events = { path = "../animat-events", features = ["test-fixtures"] }
//!
//! use animat_events::fixtures;
//!
//! let events = fixtures::sample_events();
//! let frame = fixtures::sample_frame();
//! ```

use crate::{EventType, FrameSnapshot, SimEvent};

/// Returns sample events from the fixtures file.
///
/// Contains 9 events spanning four ticks: movement, feeding, a refused
/// and a landed attack, a birth, a brain failure and a death.
pub fn sample_events() -> Vec<SimEvent> {
    let jsonl = include_str!("../tests/fixtures/sample_events.jsonl");
    jsonl
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            SimEvent::from_jsonl(l).unwrap_or_else(|e| {
                panic!("Failed to parse event line: {}\nError: {}", l, e)
            })
        })
        .collect()
}

/// Returns a 4x4 frame with three animats.
pub fn sample_frame() -> FrameSnapshot {
    let json = include_str!("../tests/fixtures/sample_frame.json");
    serde_json::from_str(json).expect("Failed to parse sample_frame.json")
}

/// Returns the sample events of one category.
pub fn events_of_type(event_type: EventType) -> Vec<SimEvent> {
    sample_events()
        .into_iter()
        .filter(|e| e.event_type() == event_type)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_events_load() {
        let events = sample_events();
        assert_eq!(events.len(), 9, "Should have 9 sample events");
        assert!(events.windows(2).all(|w| w[0].tick <= w[1].tick));
    }

    #[test]
    fn test_sample_events_cover_categories() {
        for event_type in EventType::all() {
            assert!(
                !events_of_type(*event_type).is_empty(),
                "missing sample for {:?}",
                event_type
            );
        }
    }

    #[test]
    fn test_sample_frame_load() {
        let frame = sample_frame();
        assert_eq!(frame.board_size, 4);
        assert_eq!(frame.food.len(), 16);
        assert_eq!(frame.population(), 3);
        assert_eq!(frame.food_at(1, 1), Some(4));
    }
}
