//! Mating Actions
//!
//! Reproduction with the animat in front. The offspring lands on a random
//! free cell; when none turns up within the configured number of draws the
//! attempt is abandoned for this tick and nothing is paid.

use animat_events::EventKind;
use tracing::{debug, warn};

use super::{ActionContext, ActionOutcome};
use crate::components::{forward, Animat, AnimatId, Direction};
use crate::config::MarkerPolicy;

/// Mates with the forward occupant if both face the same way and the actor
/// can pay `mate_cost` energy.
pub fn apply_mate(ctx: &mut ActionContext<'_>, actor: AnimatId, outcome: &mut ActionOutcome) {
    let config = ctx.config;
    let Some(parent) = ctx.population.get(actor) else {
        return;
    };

    if let Some(cap) = config.world.max_population {
        if ctx.population.len() >= cap {
            debug!("{} cannot mate: population at cap {}", actor, cap);
            return;
        }
    }
    if parent.energy < config.costs.mate_cost {
        return;
    }

    let front = forward(outcome.position, parent.facing, ctx.grid.size());
    let Some(partner_id) = ctx.grid.occupant(front).filter(|&id| id != actor) else {
        return;
    };
    let Some(partner) = ctx.population.get(partner_id) else {
        return;
    };
    if partner.facing != parent.facing {
        return;
    }

    let spot = match ctx
        .grid
        .random_free_cell(&mut *ctx.rng, config.world.placement_attempts)
    {
        Ok(spot) => spot,
        Err(e) => {
            warn!("{} could not place offspring: {}", actor, e);
            ctx.emit(EventKind::PlacementExhausted {
                animat: actor.0,
                attempts: config.world.placement_attempts,
            });
            return;
        }
    };

    let offspring = parent.brain.combine(partner.brain.as_ref(), &mut *ctx.rng);
    let group = match config.social.offspring_marker {
        MarkerPolicy::InheritParent => parent.group,
        MarkerPolicy::FromCombine => offspring
            .marker_hint
            .or_else(|| ctx.population.unused_marker())
            .unwrap_or(parent.group),
    };

    let child_id = ctx.ids.next_id();
    if let Err(e) = ctx.grid.place_animat(spot, child_id) {
        warn!("{} offspring placement rejected: {}", actor, e);
        return;
    }
    let child = Animat::new(
        child_id,
        group,
        Direction::random(&mut *ctx.rng),
        config.resources.initial_health,
        config.resources.initial_energy,
        offspring.brain,
    )
    .with_born_tick(ctx.tick);
    ctx.population.insert(child);

    if let Some(parent) = ctx.population.get_mut(actor) {
        parent.spend_energy(config.costs.mate_cost);
    }

    outcome.offspring = Some(child_id);
    ctx.emit(EventKind::Born {
        animat: child_id.0,
        parents: [actor.0, partner_id.0],
        at: spot.into(),
        group: group.0,
    });
}
