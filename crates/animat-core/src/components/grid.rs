//! Grid Components
//!
//! The board: a square array of cells holding food and at most one animat.
//! The grid is the only place that records where an animat stands.

use bevy_ecs::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::animat::AnimatId;
use super::geometry::Position;
use crate::error::SimError;

/// One board location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Food available, never above the grid's `max_food`
    pub food: u32,
    /// Exclusive upper bound of the random amount added on each regrowth
    pub regrowth_rate: u32,
    pub occupant: Option<AnimatId>,
}

impl Cell {
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}

/// Resource: the toroidal board
#[derive(Resource, Debug, Clone)]
pub struct Grid {
    size: usize,
    max_food: u32,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(size: usize, max_food: u32) -> Result<Self, SimError> {
        if size == 0 {
            return Err(SimError::config("board size must be at least 1"));
        }
        Ok(Self {
            size,
            max_food,
            cells: vec![Cell::default(); size * size],
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_food(&self) -> u32 {
        self.max_food
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Normalizes any position onto the board.
    pub fn wrap(&self, pos: Position) -> Position {
        Position::new(pos.x % self.size, pos.y % self.size)
    }

    fn index(&self, pos: Position) -> usize {
        let pos = self.wrap(pos);
        pos.y * self.size + pos.x
    }

    fn position_of(&self, index: usize) -> Position {
        Position::new(index % self.size, index / self.size)
    }

    pub fn cell(&self, pos: Position) -> &Cell {
        &self.cells[self.index(pos)]
    }

    pub fn cell_mut(&mut self, pos: Position) -> &mut Cell {
        let index = self.index(pos);
        &mut self.cells[index]
    }

    pub fn occupant(&self, pos: Position) -> Option<AnimatId> {
        self.cell(pos).occupant
    }

    pub fn food(&self, pos: Position) -> u32 {
        self.cell(pos).food
    }

    /// Sets food, clamped to the maximum.
    pub fn set_food(&mut self, pos: Position, amount: u32) {
        let max = self.max_food;
        self.cell_mut(pos).food = amount.min(max);
    }

    /// Adds food, saturating at the maximum.
    pub fn add_food(&mut self, pos: Position, amount: u32) {
        let max = self.max_food;
        let cell = self.cell_mut(pos);
        cell.food = cell.food.saturating_add(amount).min(max);
    }

    /// Removes and returns all food in the cell.
    pub fn take_food(&mut self, pos: Position) -> u32 {
        std::mem::take(&mut self.cell_mut(pos).food)
    }

    pub fn set_regrowth_rate(&mut self, pos: Position, rate: u32) {
        self.cell_mut(pos).regrowth_rate = rate;
    }

    /// Puts an animat on an empty cell. Never overwrites an occupant.
    pub fn place_animat(&mut self, pos: Position, animat: AnimatId) -> Result<(), SimError> {
        let pos = self.wrap(pos);
        let cell = self.cell_mut(pos);
        if cell.occupant.is_some() {
            return Err(SimError::OccupancyConflict(pos));
        }
        cell.occupant = Some(animat);
        Ok(())
    }

    /// Clears occupancy, returning whoever stood there.
    pub fn remove_animat(&mut self, pos: Position) -> Option<AnimatId> {
        self.cell_mut(pos).occupant.take()
    }

    /// Transfers the occupant of `from` to `to` in one step.
    ///
    /// Fails with `OccupancyConflict` when `to` is taken; `from` is left
    /// untouched in that case.
    pub fn move_animat(&mut self, from: Position, to: Position) -> Result<(), SimError> {
        let to = self.wrap(to);
        if self.cell(to).is_occupied() {
            return Err(SimError::OccupancyConflict(to));
        }
        if let Some(animat) = self.remove_animat(from) {
            self.cell_mut(to).occupant = Some(animat);
        }
        Ok(())
    }

    /// Every occupied cell in row-major order.
    pub fn occupied(&self) -> Vec<(Position, AnimatId)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.occupant.map(|id| (self.position_of(i), id)))
            .collect()
    }

    /// Current position of an animat, by scanning the board.
    pub fn locate(&self, animat: AnimatId) -> Option<Position> {
        self.cells
            .iter()
            .position(|cell| cell.occupant == Some(animat))
            .map(|i| self.position_of(i))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_occupied()).count()
    }

    pub fn is_full(&self) -> bool {
        self.occupied_count() == self.cells.len()
    }

    pub fn first_free_cell(&self) -> Option<Position> {
        self.cells
            .iter()
            .position(|cell| !cell.is_occupied())
            .map(|i| self.position_of(i))
    }

    /// Draws uniformly random cells until a free one turns up, giving up
    /// after `attempts` draws.
    pub fn random_free_cell<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        attempts: u32,
    ) -> Result<Position, SimError> {
        for _ in 0..attempts {
            let pos = Position::new(rng.gen_range(0..self.size), rng.gen_range(0..self.size));
            if !self.cell(pos).is_occupied() {
                return Ok(pos);
            }
        }
        Err(SimError::RetryExhausted { attempts })
    }

    /// Adds a random amount in `[0, regrowth_rate)` to every cell, clamped
    /// to the maximum. Runs only on ticks that are multiples of `interval`.
    /// Returns whether growth ran.
    pub fn regrow<R: Rng + ?Sized>(&mut self, tick: u64, interval: u64, rng: &mut R) -> bool {
        if interval == 0 || tick % interval != 0 {
            return false;
        }
        let max = self.max_food;
        for cell in &mut self.cells {
            if cell.regrowth_rate == 0 {
                continue;
            }
            let growth = rng.gen_range(0..cell.regrowth_rate);
            cell.food = cell.food.saturating_add(growth).min(max);
        }
        true
    }

    pub fn total_food(&self) -> u64 {
        self.cells.iter().map(|c| c.food as u64).sum()
    }

    /// Food per cell in row-major order.
    pub fn food_layer(&self) -> Vec<u32> {
        self.cells.iter().map(|c| c.food).collect()
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.cells.len()).map(|i| self.position_of(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(Grid::new(0, 4), Err(SimError::Configuration(_))));
    }

    #[test]
    fn test_place_never_overwrites() {
        let mut grid = Grid::new(3, 4).unwrap();
        let pos = Position::new(1, 1);
        grid.place_animat(pos, AnimatId(1)).unwrap();
        let err = grid.place_animat(pos, AnimatId(2)).unwrap_err();
        assert!(matches!(err, SimError::OccupancyConflict(p) if p == pos));
        assert_eq!(grid.occupant(pos), Some(AnimatId(1)));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut grid = Grid::new(2, 4).unwrap();
        let pos = Position::new(0, 1);
        grid.place_animat(pos, AnimatId(5)).unwrap();
        assert_eq!(grid.remove_animat(pos), Some(AnimatId(5)));
        assert_eq!(grid.remove_animat(pos), None);
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn test_move_transfers_atomically() {
        let mut grid = Grid::new(4, 4).unwrap();
        let from = Position::new(0, 0);
        let to = Position::new(1, 0);
        grid.place_animat(from, AnimatId(1)).unwrap();
        grid.move_animat(from, to).unwrap();
        assert_eq!(grid.occupant(from), None);
        assert_eq!(grid.occupant(to), Some(AnimatId(1)));

        grid.place_animat(from, AnimatId(2)).unwrap();
        assert!(grid.move_animat(from, to).is_err());
        assert_eq!(grid.occupant(from), Some(AnimatId(2)));
        assert_eq!(grid.occupant(to), Some(AnimatId(1)));
    }

    #[test]
    fn test_food_is_clamped() {
        let mut grid = Grid::new(2, 4).unwrap();
        let pos = Position::new(1, 1);
        grid.set_food(pos, 10);
        assert_eq!(grid.food(pos), 4);
        grid.set_food(pos, 3);
        grid.add_food(pos, u32::MAX);
        assert_eq!(grid.food(pos), 4);
        assert_eq!(grid.take_food(pos), 4);
        assert_eq!(grid.food(pos), 0);
    }

    #[test]
    fn test_occupied_is_row_major() {
        let mut grid = Grid::new(3, 4).unwrap();
        grid.place_animat(Position::new(2, 0), AnimatId(1)).unwrap();
        grid.place_animat(Position::new(0, 1), AnimatId(2)).unwrap();
        grid.place_animat(Position::new(1, 0), AnimatId(3)).unwrap();
        let ids: Vec<_> = grid.occupied().into_iter().map(|(_, id)| id).collect();
        assert_eq!(ids, vec![AnimatId(3), AnimatId(1), AnimatId(2)]);
        assert_eq!(grid.locate(AnimatId(2)), Some(Position::new(0, 1)));
    }

    #[test]
    fn test_random_free_cell_is_bounded() {
        let mut grid = Grid::new(2, 4).unwrap();
        for (i, pos) in grid.positions().collect::<Vec<_>>().into_iter().enumerate() {
            grid.place_animat(pos, AnimatId(i as u64)).unwrap();
        }
        let mut rng = SmallRng::seed_from_u64(1);
        let err = grid.random_free_cell(&mut rng, 16).unwrap_err();
        assert!(matches!(err, SimError::RetryExhausted { attempts: 16 }));
        assert!(grid.is_full());
        assert!(grid.first_free_cell().is_none());
    }

    #[test]
    fn test_regrow_respects_cadence_and_cap() {
        let mut grid = Grid::new(4, 4).unwrap();
        let positions: Vec<_> = grid.positions().collect();
        for pos in &positions {
            grid.set_regrowth_rate(*pos, 3);
        }
        let mut rng = SmallRng::seed_from_u64(7);
        assert!(!grid.regrow(3, 5, &mut rng));
        assert_eq!(grid.total_food(), 0);

        for tick in 0..200 {
            grid.regrow(tick, 5, &mut rng);
        }
        assert!(positions.iter().all(|p| grid.food(*p) <= 4));
        assert!(grid.total_food() > 0);
    }
}
