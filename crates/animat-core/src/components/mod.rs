//! Simulation Components
//!
//! Board geometry, the grid, animats, and the reputation ledger.

pub mod geometry;
pub mod grid;
pub mod animat;
pub mod social;

pub use geometry::*;
pub use grid::*;
pub use animat::*;
pub use social::*;
