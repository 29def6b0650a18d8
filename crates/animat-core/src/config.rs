//! Configuration loading for the simulation.
//!
//! Run parameters come from a TOML file. Every section is optional and
//! falls back to its defaults; `validate` rejects bad values before any
//! state is built.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SimError;
use crate::systems::perception::MAX_EVENTS;

/// Complete simulation configuration.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Board, population and run length
    #[serde(default)]
    pub world: WorldConfig,
    /// Food, vitals and their caps
    #[serde(default)]
    pub resources: ResourceConfig,
    /// Per-action costs
    #[serde(default)]
    pub costs: CostConfig,
    /// Reputation and group behaviour
    #[serde(default)]
    pub social: SocialConfig,
    /// Decision module selection and tuning
    #[serde(default)]
    pub learning: LearningConfig,
    #[serde(default)]
    pub perception: PerceptionConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
}

impl SimConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, SimError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, SimError> {
        Ok(toml::from_str(content)?)
    }

    /// Renders the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, SimError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks every value the engine relies on.
    pub fn validate(&self) -> Result<(), SimError> {
        let w = &self.world;
        let r = &self.resources;
        let c = &self.costs;
        let s = &self.social;
        let l = &self.learning;

        if w.board_size == 0 {
            return Err(SimError::config("board_size must be at least 1"));
        }
        let cells = w.board_size.checked_mul(w.board_size).ok_or_else(|| {
            SimError::config(format!("board_size {} is too large", w.board_size))
        })?;
        if w.initial_animats > cells {
            return Err(SimError::config(format!(
                "initial_animats {} exceeds the {} cells of the board",
                w.initial_animats, cells
            )));
        }
        if w.group_count == 0 {
            return Err(SimError::config("group_count must be at least 1"));
        }
        if w.placement_attempts == 0 {
            return Err(SimError::config("placement_attempts must be at least 1"));
        }
        if w.max_population == Some(0) {
            return Err(SimError::config("max_population must be at least 1 when set"));
        }

        if r.max_food == 0 || r.max_health == 0 || r.max_energy == 0 {
            return Err(SimError::config("max_food, max_health and max_energy must be positive"));
        }
        if r.initial_health == 0 || r.initial_health > r.max_health {
            return Err(SimError::config(format!(
                "initial_health {} must be within 1..={}",
                r.initial_health, r.max_health
            )));
        }
        if r.initial_energy > r.max_energy {
            return Err(SimError::config(format!(
                "initial_energy {} exceeds max_energy {}",
                r.initial_energy, r.max_energy
            )));
        }
        if r.regrowth_interval == 0 {
            return Err(SimError::config("regrowth_interval must be at least 1"));
        }

        if c.attack_damage == 0 {
            return Err(SimError::config("attack_damage must be positive"));
        }
        if c.mate_cost == 0 {
            return Err(SimError::config("mate_cost must be positive"));
        }

        if !(s.damping_factor.is_finite() && s.damping_factor > 0.0) {
            return Err(SimError::config(format!(
                "damping_factor must be positive and finite, got {}",
                s.damping_factor
            )));
        }
        if !s.grudge_unit.is_finite() || !s.reputation_weight.is_finite() {
            return Err(SimError::config("grudge_unit and reputation_weight must be finite"));
        }

        if l.reward_window < 2 || l.reward_window % 2 != 0 {
            return Err(SimError::config(format!(
                "reward_window must be even and at least 2, got {}",
                l.reward_window
            )));
        }
        if !(0.0..=1.0).contains(&l.exploration) {
            return Err(SimError::config("exploration must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&l.mutation_rate) {
            return Err(SimError::config("mutation_rate must be within [0, 1]"));
        }
        if !l.learning_rate.is_finite() || !(l.mutation_scale.is_finite() && l.mutation_scale >= 0.0) {
            return Err(SimError::config("learning_rate and mutation_scale must be finite"));
        }

        if self.perception.max_events > MAX_EVENTS {
            return Err(SimError::config(format!(
                "max_events {} exceeds the observation capacity of {}",
                self.perception.max_events, MAX_EVENTS
            )));
        }
        Ok(())
    }
}

/// How food is laid out on a fresh board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FoodLayout {
    /// Concentric rings around the board centre
    #[default]
    Rings,
    /// Random amount per cell
    Uniform,
}

/// Group marker given to a newborn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarkerPolicy {
    /// Same marker as the animat that initiated mating
    #[default]
    InheritParent,
    /// Marker suggested by the brains' combine, else the parent's
    FromCombine,
}

/// Decision module used for the initial population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BrainKind {
    #[default]
    Learning,
    Random,
    ScriptedStay,
}

impl BrainKind {
    pub fn name(self) -> &'static str {
        match self {
            BrainKind::Learning => "learning",
            BrainKind::Random => "random",
            BrainKind::ScriptedStay => "scripted_stay",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Side length of the square torus
    pub board_size: usize,
    pub ticks: u64,
    pub initial_animats: usize,
    /// Initial animats cycle through this many group markers
    pub group_count: u8,
    pub seed: u64,
    pub food_layout: FoodLayout,
    /// Outermost food ring for the `rings` layout
    pub food_ring_radius: usize,
    /// Mating is a no-op once the population reaches this size
    pub max_population: Option<usize>,
    /// Remove animats whose health reached zero
    pub death_enabled: bool,
    /// Random draws before a free-cell search gives up
    pub placement_attempts: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            board_size: 16,
            ticks: 1000,
            initial_animats: 8,
            group_count: 8,
            seed: 42,
            food_layout: FoodLayout::Rings,
            food_ring_radius: 4,
            max_population: None,
            death_enabled: false,
            placement_attempts: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub max_food: u32,
    /// Upper bound (exclusive) of food added per cell on a regrowth tick
    pub regrowth_rate: u32,
    /// Regrowth runs on ticks divisible by this
    pub regrowth_interval: u64,
    pub max_health: u32,
    pub max_energy: u32,
    pub initial_health: u32,
    pub initial_energy: u32,
    /// Energy above this converts into health after eating
    pub recovery_threshold: u32,
    /// Recovery only applies below this health
    pub recovery_health_cap: u32,
    pub recovery_amount: u32,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            max_food: 4,
            regrowth_rate: 2,
            regrowth_interval: 10,
            max_health: 255,
            max_energy: 255,
            initial_health: 128,
            initial_energy: 64,
            recovery_threshold: 192,
            recovery_health_cap: 240,
            recovery_amount: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Health paid for a successful forward move
    pub move_cost: u32,
    /// Health paid for a turn
    pub turn_cost: u32,
    pub attack_damage: u32,
    /// Energy paid by the initiating parent
    pub mate_cost: u32,
    /// Charge `move_cost` even when the forward cell is occupied
    pub charge_blocked_move: bool,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            move_cost: 1,
            turn_cost: 0,
            attack_damage: 3,
            mate_cost: 64,
            charge_blocked_move: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    /// Sentiment lost by the victim toward the attacker's group
    pub grudge_unit: f64,
    /// Divides third-party grudge propagation
    pub damping_factor: f64,
    /// Weight of group standing in the fitness signal
    pub reputation_weight: f64,
    pub attack_requires_energy_advantage: bool,
    pub offspring_marker: MarkerPolicy,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            grudge_unit: 1.0,
            damping_factor: 2.0,
            reputation_weight: 0.0,
            attack_requires_energy_advantage: true,
            offspring_marker: MarkerPolicy::InheritParent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub brain: BrainKind,
    /// Total reward window slots; split evenly into credit and debit halves
    pub reward_window: usize,
    pub learning_rate: f64,
    pub exploration: f64,
    pub mutation_rate: f64,
    pub mutation_scale: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            brain: BrainKind::Learning,
            reward_window: 2,
            learning_rate: 0.01,
            exploration: 0.05,
            mutation_rate: 0.05,
            mutation_scale: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Radius of the nearby-animat ring scan; 0 disables it
    pub scan_radius: usize,
    pub max_events: usize,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            scan_radius: 0,
            max_events: MAX_EVENTS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Only record the final N ticks; absent records every tick
    pub last_ticks: Option<u64>,
}
