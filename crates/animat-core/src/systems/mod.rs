//! ECS Systems
//!
//! Perception, reward windows and the tick schedule that drives them.

pub mod perception;
pub mod reward;
pub mod tick;

pub use perception::{observe, ring_offsets, Bearing, NearbyEvent, NeighborView, Observation, OccupantView, INPUT_SIZE, MAX_EVENTS};
pub use reward::{fitness, RewardWindow, RewardWindows};
pub use tick::{
    build_tick_schedule, capture_frame, collect_active, randomize_order, regrow_food, run_turns,
    take_turn, TickPhase, TickState, TurnOrder,
};
