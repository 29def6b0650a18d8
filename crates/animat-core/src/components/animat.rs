//! Animat Components
//!
//! Identity, vitals and facing of individual animats, plus the population
//! registry and the identity allocator.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::geometry::Direction;
use crate::brain::Brain;

/// Stable identity of an animat, never reused within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimatId(pub u64);

impl fmt::Display for AnimatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "animat_{:04}", self.0)
    }
}

/// Small enumerable marker used for in-group/out-group features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct GroupMarker(pub u8);

impl fmt::Display for GroupMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group_{}", self.0)
    }
}

/// An agent on the board. Position lives in the grid, not here.
pub struct Animat {
    pub id: AnimatId,
    pub health: u32,
    pub energy: u32,
    pub facing: Direction,
    pub group: GroupMarker,
    /// Group marker of the last animat attacked this tick
    pub target: Option<GroupMarker>,
    pub brain: Box<dyn Brain>,
    pub born_tick: u64,
}

impl Animat {
    pub fn new(
        id: AnimatId,
        group: GroupMarker,
        facing: Direction,
        health: u32,
        energy: u32,
        brain: Box<dyn Brain>,
    ) -> Self {
        Self {
            id,
            health,
            energy,
            facing,
            group,
            target: None,
            brain,
            born_tick: 0,
        }
    }

    pub fn with_born_tick(mut self, tick: u64) -> Self {
        self.born_tick = tick;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Subtracts health, flooring at zero.
    pub fn lose_health(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    /// Adds health up to `cap`. Returns the amount actually gained.
    pub fn gain_health(&mut self, amount: u32, cap: u32) -> u32 {
        let before = self.health;
        self.health = self.health.saturating_add(amount).min(cap.max(before));
        self.health - before
    }

    /// Adds energy up to `cap`. Returns the amount actually gained.
    pub fn gain_energy(&mut self, amount: u32, cap: u32) -> u32 {
        let before = self.energy;
        self.energy = self.energy.saturating_add(amount).min(cap.max(before));
        self.energy - before
    }

    /// Pays `amount` of energy if there is enough; otherwise leaves it alone.
    pub fn spend_energy(&mut self, amount: u32) -> bool {
        match self.energy.checked_sub(amount) {
            Some(rest) => {
                self.energy = rest;
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Animat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animat")
            .field("id", &self.id)
            .field("health", &self.health)
            .field("energy", &self.energy)
            .field("facing", &self.facing)
            .field("group", &self.group)
            .field("target", &self.target)
            .field("brain", &self.brain.kind())
            .finish()
    }
}

/// Resource: every animat currently alive on the board, by identity
#[derive(Resource, Debug, Default)]
pub struct Population {
    animats: BTreeMap<AnimatId, Animat>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, animat: Animat) {
        self.animats.insert(animat.id, animat);
    }

    pub fn remove(&mut self, id: AnimatId) -> Option<Animat> {
        self.animats.remove(&id)
    }

    pub fn get(&self, id: AnimatId) -> Option<&Animat> {
        self.animats.get(&id)
    }

    pub fn get_mut(&mut self, id: AnimatId) -> Option<&mut Animat> {
        self.animats.get_mut(&id)
    }

    pub fn contains(&self, id: AnimatId) -> bool {
        self.animats.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.animats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animats.is_empty()
    }

    /// Identities in ascending order.
    pub fn ids(&self) -> Vec<AnimatId> {
        self.animats.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Animat> {
        self.animats.values()
    }

    /// Lowest group marker no living animat carries, if any is left.
    pub fn unused_marker(&self) -> Option<GroupMarker> {
        let used: BTreeSet<GroupMarker> = self.animats.values().map(|a| a.group).collect();
        (0..=u8::MAX).map(GroupMarker).find(|marker| !used.contains(marker))
    }

    pub fn mean_health(&self) -> f64 {
        if self.animats.is_empty() {
            return 0.0;
        }
        let total: u64 = self.animats.values().map(|a| a.health as u64).sum();
        total as f64 / self.animats.len() as f64
    }
}

/// Resource: hands out animat identities
#[derive(Resource, Debug)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> AnimatId {
        let id = AnimatId(self.next);
        self.next += 1;
        id
    }

    /// Number of identities handed out so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::ScriptedBrain;

    fn animat(health: u32, energy: u32) -> Animat {
        Animat::new(
            AnimatId(1),
            GroupMarker(0),
            Direction::Up,
            health,
            energy,
            Box::new(ScriptedBrain::stay()),
        )
    }

    #[test]
    fn test_health_saturates_at_zero() {
        let mut a = animat(2, 0);
        a.lose_health(5);
        assert_eq!(a.health, 0);
        assert!(!a.is_alive());
    }

    #[test]
    fn test_gains_clamp_to_cap() {
        let mut a = animat(250, 250);
        assert_eq!(a.gain_energy(10, 255), 5);
        assert_eq!(a.energy, 255);
        assert_eq!(a.gain_health(u32::MAX, 255), 5);
        assert_eq!(a.health, 255);
    }

    #[test]
    fn test_spend_energy_requires_balance() {
        let mut a = animat(10, 3);
        assert!(!a.spend_energy(4));
        assert_eq!(a.energy, 3);
        assert!(a.spend_energy(3));
        assert_eq!(a.energy, 0);
    }

    #[test]
    fn test_id_allocator_is_monotonic() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_id(), AnimatId(1));
        assert_eq!(ids.next_id(), AnimatId(2));
        assert_eq!(ids.issued(), 2);
        assert_eq!(AnimatId(7).to_string(), "animat_0007");
    }

    #[test]
    fn test_population_orders_by_id() {
        let mut population = Population::new();
        for id in [3, 1, 2] {
            let mut a = animat(10, 0);
            a.id = AnimatId(id);
            population.insert(a);
        }
        assert_eq!(population.ids(), vec![AnimatId(1), AnimatId(2), AnimatId(3)]);
        assert_eq!(population.mean_health(), 10.0);
        assert!(population.remove(AnimatId(2)).is_some());
        assert!(!population.contains(AnimatId(2)));
    }

    #[test]
    fn test_unused_marker_skips_taken_groups() {
        let mut population = Population::new();
        assert_eq!(population.unused_marker(), Some(GroupMarker(0)));
        for (id, group) in [(1, 0), (2, 1), (3, 3)] {
            let mut a = animat(10, 0);
            a.id = AnimatId(id);
            a.group = GroupMarker(group);
            population.insert(a);
        }
        assert_eq!(population.unused_marker(), Some(GroupMarker(2)));
    }
}
