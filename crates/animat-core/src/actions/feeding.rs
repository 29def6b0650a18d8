//! Feeding Actions

use animat_events::EventKind;

use super::{ActionContext, ActionOutcome};
use crate::components::AnimatId;

/// Moves all food under the actor into its energy, clamped at the energy
/// cap. Food beyond the cap is lost with the rest of the cell's stock.
///
/// Afterwards, if energy is above the recovery threshold and health below
/// the recovery cap, health gains the recovery amount (clamped at the
/// health cap).
pub fn apply_eat(ctx: &mut ActionContext<'_>, actor: AnimatId, outcome: &mut ActionOutcome) {
    let config = ctx.config;
    let resources = &config.resources;
    if !ctx.population.contains(actor) {
        return;
    }

    let food = ctx.grid.take_food(outcome.position);
    let Some(animat) = ctx.population.get_mut(actor) else {
        return;
    };
    animat.gain_energy(food, resources.max_energy);

    let mut recovered = 0;
    if animat.energy > resources.recovery_threshold && animat.health < resources.recovery_health_cap {
        recovered = animat.gain_health(resources.recovery_amount, resources.max_health);
    }

    outcome.eaten = food;
    if food > 0 || recovered > 0 {
        ctx.emit(EventKind::Ate {
            animat: actor.0,
            amount: food,
            recovered,
        });
    }
}
