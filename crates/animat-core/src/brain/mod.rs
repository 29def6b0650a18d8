//! Decision Modules
//!
//! The engine talks to brains only through [`Brain`]: decide on an action
//! from an observation, take a delayed reward, and combine with another
//! brain to seed an offspring. Implementations are picked when animats
//! are created and can be mixed freely on one board.

pub mod learning;
pub mod random;
pub mod scripted;

pub use learning::{LearningBrain, LearningParams};
pub use random::RandomBrain;
pub use scripted::ScriptedBrain;

use rand::RngCore;
use std::any::Any;

use crate::actions::Action;
use crate::components::GroupMarker;
use crate::config::{BrainKind, LearningConfig};
use crate::error::BrainError;
use crate::systems::Observation;

/// Output of one decision
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: Action,
    /// Opaque internal state a brain may expose alongside the action
    pub raw: Option<Vec<f32>>,
}

impl Decision {
    pub fn new(action: Action) -> Self {
        Self { action, raw: None }
    }

    pub fn with_raw(mut self, raw: Vec<f32>) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// Result of combining two parent brains
pub struct Offspring {
    pub brain: Box<dyn Brain>,
    /// Group marker the brain suggests for the child, if it has an opinion
    pub marker_hint: Option<GroupMarker>,
}

/// Capability interface every decision module implements.
pub trait Brain: Send + Sync {
    /// Static identifier of the implementation.
    fn kind(&self) -> &'static str;

    /// Chooses an action. May be stochastic, drawing only from `rng`.
    fn decide(&mut self, observation: &Observation, rng: &mut dyn RngCore) -> Result<Decision, BrainError>;

    /// Receives the delayed training signal before the next decision.
    fn reward(&mut self, signal: f64) -> Result<(), BrainError>;

    /// Builds a child brain from `self` and `other`. Must always succeed,
    /// if need be by copying `self`.
    fn combine(&self, other: &dyn Brain, rng: &mut dyn RngCore) -> Offspring;

    fn clone_box(&self) -> Box<dyn Brain>;

    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn Brain> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Creates a fresh brain of the configured kind.
pub fn build_brain(kind: BrainKind, learning: &LearningConfig) -> Box<dyn Brain> {
    match kind {
        BrainKind::Learning => Box::new(LearningBrain::new(LearningParams::from(learning))),
        BrainKind::Random => Box::new(RandomBrain::default()),
        BrainKind::ScriptedStay => Box::new(ScriptedBrain::stay()),
    }
}
