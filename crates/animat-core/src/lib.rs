//! Animat Simulation Engine
//!
//! Animats forage, fight and mate on a toroidal grid while pluggable
//! brains learn from a delayed, windowed reward.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod actions;
pub mod brain;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod output;
pub mod setup;
pub mod simulation;
pub mod systems;

pub use components::*;

pub use actions::{apply_action, Action, ActionContext, ActionOutcome, Movement};
pub use brain::{build_brain, Brain, Decision, LearningBrain, Offspring, RandomBrain, ScriptedBrain};
pub use config::SimConfig;
pub use error::{BrainError, RecorderError, SimError, SimResult};
pub use events::EventLog;
pub use output::{FrameRecorder, JsonlRecorder, MemoryRecorder, NullRecorder};
pub use simulation::{AnimatSpec, Simulation, SimulationBuilder, TickReport};
pub use systems::{Observation, TickPhase};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
