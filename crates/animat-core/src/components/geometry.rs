//! Toroidal Geometry
//!
//! Coordinate arithmetic on a square board whose edges wrap around.
//! Everything here is pure and total.

use animat_events::GridPos;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wraps a signed coordinate into `[0, size)`.
pub fn wrap(coord: i64, size: usize) -> usize {
    coord.rem_euclid(size as i64) as usize
}

/// A board location. Always in range once constructed through the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Adds an offset and wraps the result onto the board.
    pub fn offset_by(self, dx: i64, dy: i64, size: usize) -> Position {
        Position {
            x: wrap(self.x as i64 + dx, size),
            y: wrap(self.y as i64 + dy, size),
        }
    }

    /// Shortest signed offset from `self` to `other` on a torus of `size`.
    pub fn delta_to(self, other: Position, size: usize) -> (i64, i64) {
        (
            shortest_axis_delta(self.x, other.x, size),
            shortest_axis_delta(self.y, other.y, size),
        )
    }
}

fn shortest_axis_delta(from: usize, to: usize, size: usize) -> i64 {
    let size = size as i64;
    let raw = (to as i64 - from as i64).rem_euclid(size);
    if raw > size / 2 {
        raw - size
    } else {
        raw
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<Position> for GridPos {
    fn from(pos: Position) -> Self {
        GridPos::new(pos.x as u32, pos.y as u32)
    }
}

/// Facing direction. The cycle order Up → Left → Down → Right is a left
/// turn at each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    /// All directions in cycle order.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Left, Direction::Down, Direction::Right];

    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Left => 1,
            Direction::Down => 2,
            Direction::Right => 3,
        }
    }

    /// Direction at `index` in the cycle, taken modulo 4.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_index(rng.gen_range(0..4))
    }

    pub fn turn_left(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn turn_right(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// Unit offset for one step in this direction (y grows downwards).
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::Up => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Down => (0, 1),
            Direction::Right => (1, 0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Left => "left",
            Direction::Down => "down",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The cell one step ahead of `pos` when facing `direction`.
pub fn forward(pos: Position, direction: Direction, size: usize) -> Position {
    let (dx, dy) = direction.offset();
    pos.offset_by(dx, dy, size)
}
