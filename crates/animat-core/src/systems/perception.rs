//! Perception System
//!
//! Builds the fixed-shape observation a brain decides from: the animat's
//! own markers, its four cardinal neighbours and, when a scan radius is
//! configured, a capped list of nearby animats found by a ring scan.

use std::collections::BTreeSet;

use crate::components::{
    forward, Animat, AnimatId, Direction, Grid, GroupMarker, Population, Position, ReputationLedger,
};
use crate::config::PerceptionConfig;

/// Capacity of the nearby-animat list.
pub const MAX_EVENTS: usize = 8;

/// Length of [`Observation::encode`]: one own bit plus six per neighbour.
pub const INPUT_SIZE: usize = 1 + 4 * NEIGHBOR_BITS;

const NEIGHBOR_BITS: usize = 6;

/// What the observer can tell about an animat next to it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccupantView {
    pub animat: AnimatId,
    pub group: GroupMarker,
    pub target: Option<GroupMarker>,
    /// Strictly more health than the observer
    pub more_health: bool,
    /// The observer holds positive sentiment toward this group
    pub friendly: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborView {
    pub position: Position,
    /// Strictly more food than the observer's own cell
    pub more_food: bool,
    pub occupant: Option<OccupantView>,
}

/// Direction of a nearby animat relative to the observer's facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bearing {
    Ahead,
    Left,
    Behind,
    Right,
}

impl Bearing {
    /// Classifies an offset seen by an animat facing `facing`.
    /// Ties between the two axes go to ahead/behind.
    pub fn relative(facing: Direction, dx: i64, dy: i64) -> Bearing {
        let (fx, fy) = facing.offset();
        let (rx, ry) = facing.turn_right().offset();
        let ahead = dx * fx + dy * fy;
        let right = dx * rx + dy * ry;
        if ahead.abs() >= right.abs() {
            if ahead >= 0 {
                Bearing::Ahead
            } else {
                Bearing::Behind
            }
        } else if right > 0 {
            Bearing::Right
        } else {
            Bearing::Left
        }
    }
}

/// An animat reported by the ring scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyEvent {
    pub animat: AnimatId,
    pub group: GroupMarker,
    pub dx: i64,
    pub dy: i64,
    pub bearing: Bearing,
    pub health: u32,
    pub energy: u32,
}

/// Fixed-shape input to a decision module
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub group: GroupMarker,
    pub target: Option<GroupMarker>,
    pub facing: Direction,
    pub health: u32,
    pub energy: u32,
    /// Up, Left, Down, Right
    pub neighbors: [NeighborView; 4],
    events: [Option<NearbyEvent>; MAX_EVENTS],
}

impl Observation {
    pub fn events(&self) -> impl Iterator<Item = &NearbyEvent> {
        self.events.iter().flatten()
    }

    pub fn event_count(&self) -> usize {
        self.events().count()
    }

    pub fn neighbor(&self, direction: Direction) -> &NeighborView {
        &self.neighbors[direction.index()]
    }

    /// Flattens the observation into 0/1 inputs.
    ///
    /// Layout: own target is own group, then per neighbour in Up, Left,
    /// Down, Right order: same group, its target is our group, healthier,
    /// more food, occupied, friendly.
    pub fn encode(&self) -> Vec<f32> {
        self.bits()
            .iter()
            .map(|&bit| if bit { 1.0 } else { 0.0 })
            .collect()
    }

    /// The encoded bits packed little-endian into an integer.
    pub fn key(&self) -> u32 {
        self.bits()
            .iter()
            .enumerate()
            .fold(0, |key, (i, &bit)| key | (u32::from(bit) << i))
    }

    fn bits(&self) -> [bool; INPUT_SIZE] {
        let mut bits = [false; INPUT_SIZE];
        bits[0] = self.target == Some(self.group);
        for (n, neighbor) in self.neighbors.iter().enumerate() {
            let base = 1 + n * NEIGHBOR_BITS;
            if let Some(occ) = neighbor.occupant {
                bits[base] = occ.group == self.group;
                bits[base + 1] = occ.target == Some(self.group);
                bits[base + 2] = occ.more_health;
                bits[base + 4] = true;
                bits[base + 5] = occ.friendly;
            }
            bits[base + 3] = neighbor.more_food;
        }
        bits
    }
}

/// Builds the observation for `animat` standing at `pos`.
pub fn observe(
    pos: Position,
    animat: &Animat,
    grid: &Grid,
    population: &Population,
    ledger: &ReputationLedger,
    perception: &PerceptionConfig,
) -> Observation {
    let here_food = grid.food(pos);
    let neighbors = Direction::ALL.map(|direction| {
        let position = forward(pos, direction, grid.size());
        let occupant = grid
            .occupant(position)
            .filter(|&id| id != animat.id)
            .and_then(|id| population.get(id))
            .map(|other| OccupantView {
                animat: other.id,
                group: other.group,
                target: other.target,
                more_health: other.health > animat.health,
                friendly: ledger.sentiment(animat.id, other.group) > 0.0,
            });
        NeighborView {
            position,
            more_food: grid.food(position) > here_food,
            occupant,
        }
    });

    let mut events = [None; MAX_EVENTS];
    let cap = perception.max_events.min(MAX_EVENTS);
    if perception.scan_radius > 0 && cap > 0 {
        for (slot, event) in scan_rings(pos, animat, grid, population, perception.scan_radius)
            .take(cap)
            .enumerate()
        {
            events[slot] = Some(event);
        }
    }

    Observation {
        group: animat.group,
        target: animat.target,
        facing: animat.facing,
        health: animat.health,
        energy: animat.energy,
        neighbors,
        events,
    }
}

/// Offsets of ring `r`: starts at the top-left corner and runs clockwise.
pub fn ring_offsets(r: usize) -> Vec<(i64, i64)> {
    if r == 0 {
        return vec![(0, 0)];
    }
    let r = r as i64;
    let mut offsets = Vec::with_capacity(8 * r as usize);
    offsets.extend((-r..=r).map(|dx| (dx, -r)));
    offsets.extend((-r + 1..=r).map(|dy| (r, dy)));
    offsets.extend((-r..r).rev().map(|dx| (dx, r)));
    offsets.extend((-r + 1..r).rev().map(|dy| (-r, dy)));
    offsets
}

fn scan_rings<'a>(
    pos: Position,
    observer: &'a Animat,
    grid: &'a Grid,
    population: &'a Population,
    radius: usize,
) -> impl Iterator<Item = NearbyEvent> + 'a {
    let size = grid.size();
    let mut seen = BTreeSet::from([pos]);
    // past the board size every cell is an alias of a nearer one
    (1..=radius.min(size))
        .flat_map(ring_offsets)
        .filter_map(move |(dx, dy)| {
            let cell = pos.offset_by(dx, dy, size);
            if !seen.insert(cell) {
                return None;
            }
            let other = population.get(grid.occupant(cell)?)?;
            let (dx, dy) = pos.delta_to(cell, size);
            Some(NearbyEvent {
                animat: other.id,
                group: other.group,
                dx,
                dy,
                bearing: Bearing::relative(observer.facing, dx, dy),
                health: other.health,
                energy: other.energy,
            })
        })
}

#[cfg(test)]
pub(crate) fn blank_observation() -> Observation {
    let empty = NeighborView {
        position: Position::new(0, 0),
        more_food: false,
        occupant: None,
    };
    Observation {
        group: GroupMarker(0),
        target: None,
        facing: Direction::Up,
        health: 0,
        energy: 0,
        neighbors: [empty; 4],
        events: [None; MAX_EVENTS],
    }
}
