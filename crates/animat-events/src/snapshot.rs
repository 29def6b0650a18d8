//! Snapshot Types
//!
//! Serialization structs for per-tick frames and run-level records.
//!
//! A frame captures everything needed to draw the board after all animat
//! actions for a tick have been applied: food per cell, and each animat's
//! position, facing and vitals.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a frame ID for the given tick.
pub fn generate_frame_id(tick: u64) -> String {
    format!("frame_{:06}", tick)
}

/// One animat as seen in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimatSnapshot {
    pub animat_id: u64,
    pub x: u32,
    pub y: u32,
    pub facing: String,
    pub group: u8,
    pub health: u32,
    pub energy: u32,
}

/// Renderable state of the board at the end of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame_id: String,
    pub tick: u64,
    pub board_size: u32,
    /// Food per cell in row-major order (`y * board_size + x`)
    pub food: Vec<u32>,
    #[serde(default)]
    pub animats: Vec<AnimatSnapshot>,
}

impl FrameSnapshot {
    pub fn new(tick: u64, board_size: u32, food: Vec<u32>, animats: Vec<AnimatSnapshot>) -> Self {
        Self {
            frame_id: generate_frame_id(tick),
            tick,
            board_size,
            food,
            animats,
        }
    }

    /// Food at a cell, `None` when the coordinate is off the board.
    pub fn food_at(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.board_size || y >= self.board_size {
            return None;
        }
        let index = (y as usize) * (self.board_size as usize) + x as usize;
        self.food.get(index).copied()
    }

    pub fn animat_at(&self, x: u32, y: u32) -> Option<&AnimatSnapshot> {
        self.animats.iter().find(|a| a.x == x && a.y == y)
    }

    pub fn animat(&self, animat_id: u64) -> Option<&AnimatSnapshot> {
        self.animats.iter().find(|a| a.animat_id == animat_id)
    }

    pub fn population(&self) -> usize {
        self.animats.len()
    }

    pub fn total_food(&self) -> u64 {
        self.food.iter().map(|&f| f as u64).sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Header written once at the start of a recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub seed: u64,
    pub board_size: u32,
    pub ticks: u64,
    pub initial_animats: u32,
    pub brain: String,
}

impl RunManifest {
    pub fn new(seed: u64, board_size: u32, ticks: u64, initial_animats: u32, brain: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            seed,
            board_size,
            ticks,
            initial_animats,
            brain: brain.into(),
        }
    }
}

/// Totals gathered over a whole run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub births: u64,
    pub deaths: u64,
    pub attacks: u64,
    pub meals: u64,
    pub brain_failures: u64,
    #[serde(default)]
    pub recorder_failures: u64,
    pub final_population: usize,
    pub mean_health: f64,
}

impl RunSummary {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
