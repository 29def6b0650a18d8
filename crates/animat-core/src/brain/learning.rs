//! Trainable Brain
//!
//! A preference table keyed by the packed observation. Decisions are
//! epsilon-greedy over the 16 action choices; the delayed reward lands on
//! the oldest decision still remembered, which lines up with the delay the
//! reward window introduces.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::Path;

use super::{Brain, Decision, Offspring};
use crate::actions::{Action, CHOICES};
use crate::config::LearningConfig;
use crate::error::{BrainError, SimError};
use crate::systems::Observation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningParams {
    pub learning_rate: f64,
    /// Probability of a uniformly random choice instead of the best one
    pub exploration: f64,
    pub mutation_rate: f64,
    pub mutation_scale: f64,
    /// How many past decisions are kept for credit assignment
    pub memory: usize,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self::from(&LearningConfig::default())
    }
}

impl From<&LearningConfig> for LearningParams {
    fn from(config: &LearningConfig) -> Self {
        Self {
            learning_rate: config.learning_rate,
            exploration: config.exploration,
            mutation_rate: config.mutation_rate,
            mutation_scale: config.mutation_scale,
            memory: config.reward_window.max(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningBrain {
    params: LearningParams,
    preferences: BTreeMap<u32, [f64; CHOICES]>,
    #[serde(skip)]
    memory: VecDeque<(u32, usize)>,
}

impl LearningBrain {
    pub fn new(params: LearningParams) -> Self {
        Self {
            params,
            preferences: BTreeMap::new(),
            memory: VecDeque::new(),
        }
    }

    pub fn params(&self) -> &LearningParams {
        &self.params
    }

    /// Replaces the tuning parameters, keeping what has been learned.
    pub fn set_params(&mut self, params: LearningParams) {
        self.params = params;
        while self.memory.len() > self.params.memory.max(1) {
            self.memory.pop_front();
        }
    }

    /// Preference row for an observation key; unseen keys are all zero.
    pub fn preferences(&self, key: u32) -> [f64; CHOICES] {
        self.preferences.get(&key).copied().unwrap_or([0.0; CHOICES])
    }

    pub fn set_preference(&mut self, key: u32, choice: usize, value: f64) {
        self.preferences.entry(key).or_insert([0.0; CHOICES])[choice % CHOICES] = value;
    }

    /// Number of observation keys with a stored row.
    pub fn table_size(&self) -> usize {
        self.preferences.len()
    }

    pub fn remembered(&self) -> usize {
        self.memory.len()
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    fn greedy_choice(&self, key: u32, rng: &mut dyn RngCore) -> usize {
        let row = self.preferences(key);
        let best = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let ties: Vec<usize> = (0..CHOICES).filter(|&c| row[c] == best).collect();
        match ties.len() {
            0 => rng.gen_range(0..CHOICES),
            1 => ties[0],
            n => ties[rng.gen_range(0..n)],
        }
    }

    fn mutate(&mut self, rng: &mut dyn RngCore) {
        let rate = self.params.mutation_rate.clamp(0.0, 1.0);
        let scale = self.params.mutation_scale.abs();
        if rate == 0.0 || scale == 0.0 {
            return;
        }
        for row in self.preferences.values_mut() {
            for value in row.iter_mut() {
                if rng.gen_bool(rate) {
                    *value += rng.gen_range(-scale..=scale);
                }
            }
        }
    }
}

impl Brain for LearningBrain {
    fn kind(&self) -> &'static str {
        "learning"
    }

    fn decide(&mut self, observation: &Observation, rng: &mut dyn RngCore) -> Result<Decision, BrainError> {
        let key = observation.key();
        let choice = if rng.gen_bool(self.params.exploration.clamp(0.0, 1.0)) {
            rng.gen_range(0..CHOICES)
        } else {
            self.greedy_choice(key, rng)
        };

        self.memory.push_back((key, choice));
        while self.memory.len() > self.params.memory.max(1) {
            self.memory.pop_front();
        }

        Ok(Decision::new(Action::from_choice(choice)).with_raw(observation.encode()))
    }

    fn reward(&mut self, signal: f64) -> Result<(), BrainError> {
        if !signal.is_finite() {
            return Err(BrainError::new(format!("non-finite reward {signal}")));
        }
        if let Some(&(key, choice)) = self.memory.front() {
            let step = self.params.learning_rate * signal;
            self.preferences.entry(key).or_insert([0.0; CHOICES])[choice] += step;
        }
        Ok(())
    }

    fn combine(&self, other: &dyn Brain, rng: &mut dyn RngCore) -> Offspring {
        let mut child = LearningBrain::new(self.params.clone());
        match other.as_any().downcast_ref::<LearningBrain>() {
            Some(other) => {
                let keys: Vec<u32> = self
                    .preferences
                    .keys()
                    .chain(other.preferences.keys())
                    .copied()
                    .collect();
                for key in keys {
                    let (a, b) = (self.preferences(key), other.preferences(key));
                    let row: [f64; CHOICES] = std::array::from_fn(|c| (a[c] + b[c]) / 2.0);
                    child.preferences.insert(key, row);
                }
            }
            None => child.preferences = self.preferences.clone(),
        }
        child.mutate(rng);
        Offspring {
            brain: Box::new(child),
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
    use crate::brain::ScriptedBrain;
    use crate::systems::perception::blank_observation;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn greedy() -> LearningBrain {
        LearningBrain::new(LearningParams {
            learning_rate: 0.5,
            exploration: 0.0,
            mutation_rate: 0.0,
            mutation_scale: 0.0,
            memory: 2,
        })
    }

    #[test]
    fn test_greedy_picks_best_choice() {
        let mut rng = SmallRng::seed_from_u64(3);
        let obs = blank_observation();
        let mut brain = greedy();
        brain.set_preference(obs.key(), 9, 1.0);

        let decision = brain.decide(&obs, &mut rng).unwrap();
        assert_eq!(decision.action, Action::from_choice(9));
        assert_eq!(decision.raw.map(|r| r.len()), Some(crate::systems::INPUT_SIZE));
    }

    #[test]
    fn test_reward_reinforces_oldest_decision() {
        let mut rng = SmallRng::seed_from_u64(8);
        let obs = blank_observation();
        let mut brain = greedy();

        let first = brain.decide(&obs, &mut rng).unwrap().action.choice_index();
        brain.reward(2.0).unwrap();
        assert_eq!(brain.preferences(obs.key())[first], 1.0);

        // the reinforced choice now wins outright
        let again = brain.decide(&obs, &mut rng).unwrap().action.choice_index();
        assert_eq!(again, first);
        assert_eq!(brain.remembered(), 2);
    }

    #[test]
    fn test_memory_is_bounded() {
        let mut rng = SmallRng::seed_from_u64(8);
        let obs = blank_observation();
        let mut brain = greedy();
        for _ in 0..5 {
            brain.decide(&obs, &mut rng).unwrap();
        }
        assert_eq!(brain.remembered(), 2);
    }

    #[test]
    fn test_non_finite_reward_is_rejected() {
        let mut brain = greedy();
        assert!(brain.reward(f64::NAN).is_err());
        assert!(brain.reward(f64::INFINITY).is_err());
        assert!(brain.reward(-3.0).is_ok());
    }

    #[test]
    fn test_combine_averages_parents() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut a = greedy();
        let mut b = greedy();
        a.set_preference(5, 0, 4.0);
        b.set_preference(5, 0, 2.0);
        b.set_preference(6, 3, 1.0);

        let child = a.combine(&b, &mut rng);
        let child = child.brain.as_any().downcast_ref::<LearningBrain>().unwrap();
        assert_eq!(child.preferences(5)[0], 3.0);
        assert_eq!(child.preferences(6)[3], 0.5);
        assert_eq!(child.table_size(), 2);
    }

    #[test]
    fn test_combine_with_foreign_brain_copies_self() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut a = greedy();
        a.set_preference(1, 2, 7.0);
        let child = a.combine(&ScriptedBrain::stay(), &mut rng);
        let child = child.brain.as_any().downcast_ref::<LearningBrain>().unwrap();
        assert_eq!(child.preferences(1)[2], 7.0);
    }

    #[test]
    fn test_mutation_perturbs_within_scale() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut a = LearningBrain::new(LearningParams {
            mutation_rate: 1.0,
            mutation_scale: 0.25,
            ..greedy().params().clone()
        });
        a.set_preference(0, 0, 1.0);
        let child = a.combine(&a.clone(), &mut rng);
        let child = child.brain.as_any().downcast_ref::<LearningBrain>().unwrap();
        assert!(child.preferences(0).iter().all(|v| v.abs() <= 1.25));
        assert_ne!(child.preferences(0), a.preferences(0));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brain.json");
        let mut brain = greedy();
        brain.set_preference(42, 7, -1.5);
        brain.save(&path).unwrap();

        let loaded = LearningBrain::load(&path).unwrap();
        assert_eq!(loaded.preferences(42)[7], -1.5);
        assert_eq!(loaded.params(), brain.params());
        assert_eq!(loaded.remembered(), 0);
    }
}
