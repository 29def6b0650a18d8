//! Conflict Actions
//!
//! Attacks resolve against the animat directly in front, never at range.

use animat_events::EventKind;
use tracing::debug;

use super::{ActionContext, ActionOutcome};
use crate::components::{forward, AnimatId};

/// Deals `attack_damage` to the occupant of the forward cell.
///
/// With `attack_requires_energy_advantage` the attacker must have at least
/// the target's energy, otherwise nothing happens. A landed attack marks
/// the target's group as the attacker's target and updates the reputation
/// ledger for every animat on the board.
pub fn apply_attack(ctx: &mut ActionContext<'_>, actor: AnimatId, outcome: &mut ActionOutcome) {
    let config = ctx.config;
    let Some(attacker) = ctx.population.get(actor) else {
        return;
    };
    let attacker_group = attacker.group;
    let attacker_energy = attacker.energy;
    let front = forward(outcome.position, attacker.facing, ctx.grid.size());

    let Some(target_id) = ctx.grid.occupant(front).filter(|&id| id != actor) else {
        return;
    };
    let Some(target) = ctx.population.get_mut(target_id) else {
        return;
    };

    if config.social.attack_requires_energy_advantage && attacker_energy < target.energy {
        debug!(
            "{} refused: energy {} below {}'s {}",
            actor, attacker_energy, target_id, target.energy
        );
        ctx.emit(EventKind::AttackRefused {
            attacker: actor.0,
            target: target_id.0,
        });
        return;
    }

    let damage = config.costs.attack_damage;
    let target_group = target.group;
    target.lose_health(damage);

    if let Some(attacker) = ctx.population.get_mut(actor) {
        attacker.target = Some(target_group);
    }

    let observers = ctx.population.ids();
    let update = ctx.ledger.record_attack(
        attacker_group,
        target_id,
        target_group,
        &observers,
        config.social.grudge_unit,
        config.social.damping_factor,
    );
    for (observer, drop) in &update.changes {
        debug!("{} grudge toward {} fell by {:.3}", observer, attacker_group, drop);
    }

    outcome.attacked = Some(target_id);
    ctx.emit(EventKind::Attacked {
        attacker: actor.0,
        target: target_id.0,
        damage,
    });
}
