//! Brain that ignores its input and acts uniformly at random.

use rand::{Rng, RngCore};
use std::any::Any;

use super::{Brain, Decision, Offspring};
use crate::actions::{Action, Movement};
use crate::error::BrainError;
use crate::systems::Observation;

#[derive(Debug, Clone)]
pub struct RandomBrain {
    pub attack_chance: f64,
    pub mate_chance: f64,
}

impl Default for RandomBrain {
    fn default() -> Self {
        Self {
            attack_chance: 0.25,
            mate_chance: 0.1,
        }
    }
}

impl Brain for RandomBrain {
    fn kind(&self) -> &'static str {
        "random"
    }

    fn decide(&mut self, _observation: &Observation, rng: &mut dyn RngCore) -> Result<Decision, BrainError> {
        let action = Action {
            movement: Movement::from_index(rng.gen_range(0..4)),
            eat: true,
            attack: rng.gen_bool(self.attack_chance.clamp(0.0, 1.0)),
            mate: rng.gen_bool(self.mate_chance.clamp(0.0, 1.0)),
        };
        Ok(Decision::new(action))
    }

    fn reward(&mut self, _signal: f64) -> Result<(), BrainError> {
        Ok(())
    }

    fn combine(&self, _other: &dyn Brain, _rng: &mut dyn RngCore) -> Offspring {
        Offspring {
            brain: Box::new(self.clone()),
            marker_hint: None,
        }
    }

    fn clone_box(&self) -> Box<dyn Brain> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
