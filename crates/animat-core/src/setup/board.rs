//! Board Setup
//!
//! Lays out initial food and sets every cell's regrowth rate.

use rand::{Rng, RngCore};
use tracing::debug;

use crate::components::{Grid, Position};
use crate::config::{FoodLayout, ResourceConfig, WorldConfig};

/// Seeds food according to the configured layout.
pub fn seed_food(grid: &mut Grid, world: &WorldConfig, resources: &ResourceConfig, rng: &mut dyn RngCore) {
    let positions: Vec<Position> = grid.positions().collect();
    for &pos in &positions {
        grid.set_regrowth_rate(pos, resources.regrowth_rate);
    }

    match world.food_layout {
        // rings past the board size only alias nearer, richer cells
        FoodLayout::Rings => seed_rings(grid, world.food_ring_radius.min(grid.size())),
        FoodLayout::Uniform => {
            let max = grid.max_food();
            for pos in positions {
                grid.set_food(pos, rng.gen_range(0..=max));
            }
        }
    }
    debug!("seeded {} food across {} cells", grid.total_food(), grid.cell_count());
}

/// Concentric rings around the centre. A cell belongs to ring `k`, the
/// smallest `k >= 1` with `dx² + dy² < k²`, and gets `max_food - (k - 1)`.
fn seed_rings(grid: &mut Grid, radius: usize) {
    let size = grid.size();
    let centre = Position::new(size / 2, size / 2);
    let max = grid.max_food();
    let r = radius as i64;

    for dx in -r..=r {
        for dy in -r..=r {
            let dist_sq = dx * dx + dy * dy;
            let Some(ring) = (1..=r).find(|k| dist_sq < k * k) else {
                continue;
            };
            let amount = max.saturating_sub((ring - 1) as u32);
            let pos = centre.offset_by(dx, dy, size);
            // small boards alias several offsets onto one cell; keep the richest
            if amount > grid.food(pos) {
                grid.set_food(pos, amount);
            }
        }
    }
}
