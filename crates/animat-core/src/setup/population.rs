//! Animat Spawning
//!
//! Places the starting population with cycling group markers and facings.

use rand::RngCore;
use std::collections::BTreeMap;
use tracing::info;

use crate::brain::Brain;
use crate::components::{Animat, AnimatId, Direction, Grid, GroupMarker, IdAllocator, Population};
use crate::config::SimConfig;
use crate::error::SimError;

/// What the initial spawn produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnSummary {
    pub total: usize,
    pub by_group: BTreeMap<GroupMarker, usize>,
    /// Animats placed by the row-major fallback after random draws failed
    pub fallback_placements: usize,
}

/// Spawns `world.initial_animats` animats.
///
/// Animat `i` gets group `i mod group_count` and facing `i mod 4`. Cells
/// are drawn at random with bounded retries; after that the first free
/// cell in row-major order is used.
pub fn spawn_initial_animats(
    config: &SimConfig,
    grid: &mut Grid,
    population: &mut Population,
    ids: &mut IdAllocator,
    rng: &mut dyn RngCore,
    mut brain_for: impl FnMut(usize) -> Box<dyn Brain>,
) -> Result<SpawnSummary, SimError> {
    let world = &config.world;
    let resources = &config.resources;
    let mut summary = SpawnSummary::default();

    for i in 0..world.initial_animats {
        let pos = match grid.random_free_cell(&mut *rng, world.placement_attempts) {
            Ok(pos) => pos,
            Err(e) => {
                summary.fallback_placements += 1;
                grid.first_free_cell().ok_or(e)?
            }
        };

        let id: AnimatId = ids.next_id();
        let group = GroupMarker((i % usize::from(world.group_count.max(1))) as u8);
        grid.place_animat(pos, id)?;
        population.insert(Animat::new(
            id,
            group,
            Direction::from_index(i),
            resources.initial_health,
            resources.initial_energy,
            brain_for(i),
        ));

        summary.total += 1;
        *summary.by_group.entry(group).or_insert(0) += 1;
    }

    info!(
        "spawned {} animats across {} groups",
        summary.total,
        summary.by_group.len()
    );
    Ok(summary)
}
