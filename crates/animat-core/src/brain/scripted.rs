//! Fixed-policy brain: replays a script of actions in a loop.

use rand::RngCore;
use std::any::Any;

use super::{Brain, Decision, Offspring};
use crate::actions::Action;
use crate::error::BrainError;
use crate::systems::Observation;

#[derive(Debug, Clone)]
pub struct ScriptedBrain {
    script: Vec<Action>,
    cursor: usize,
    rewards: Vec<f64>,
}

impl ScriptedBrain {
    /// An empty script behaves like [`ScriptedBrain::stay`].
    pub fn new(script: Vec<Action>) -> Self {
        let script = if script.is_empty() {
            vec![Action::stay()]
        } else {
            script
        };
        Self {
            script,
            cursor: 0,
            rewards: Vec::new(),
        }
    }

    pub fn stay() -> Self {
        Self::new(vec![Action::stay()])
    }

    pub fn constant(action: Action) -> Self {
        Self::new(vec![action])
    }

    /// Every reward signal received so far, oldest first.
    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    pub fn decisions_made(&self) -> usize {
        self.cursor
    }
}

impl Brain for ScriptedBrain {
    fn kind(&self) -> &'static str {
        "scripted"
    }

    fn decide(&mut self, _observation: &Observation, _rng: &mut dyn RngCore) -> Result<Decision, BrainError> {
        let action = self.script[self.cursor % self.script.len()];
        self.cursor += 1;
        Ok(Decision::new(action))
    }

    fn reward(&mut self, signal: f64) -> Result<(), BrainError> {
        self.rewards.push(signal);
        Ok(())
    }

    fn combine(&self, _other: &dyn Brain, _rng: &mut dyn RngCore) -> Offspring {
        Offspring {
            brain: Box::new(Self::new(self.script.clone())),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Movement;
    use crate::systems::perception::blank_observation;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_script_loops() {
        let mut rng = SmallRng::seed_from_u64(0);
        let obs = blank_observation();
        let mut brain = ScriptedBrain::new(vec![
            Action::moving(Movement::Forward),
            Action::moving(Movement::TurnLeft).with_attack(),
        ]);
        let picks: Vec<_> = (0..3)
            .map(|_| brain.decide(&obs, &mut rng).unwrap().action.movement)
            .collect();
        assert_eq!(picks, vec![Movement::Forward, Movement::TurnLeft, Movement::Forward]);
        assert_eq!(brain.decisions_made(), 3);
    }

    #[test]
    fn test_rewards_are_recorded() {
        let mut brain = ScriptedBrain::stay();
        brain.reward(1.5).unwrap();
        brain.reward(-2.0).unwrap();
        assert_eq!(brain.rewards(), &[1.5, -2.0]);
    }

    #[test]
    fn test_combine_restarts_script() {
        let mut rng = SmallRng::seed_from_u64(0);
        let parent = ScriptedBrain::constant(Action::stay().with_eat());
        let child = parent.combine(&ScriptedBrain::stay(), &mut rng);
        assert!(child.marker_hint.is_none());
        let child = child.brain.as_any().downcast_ref::<ScriptedBrain>().unwrap().clone();
        assert_eq!(child.decisions_made(), 0);
        assert!(child.rewards().is_empty());
    }
}
