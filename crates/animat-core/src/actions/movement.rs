//! Movement Actions
//!
//! Turning in place and stepping into the cell in front.

use animat_events::EventKind;
use tracing::debug;

use super::{ActionContext, ActionOutcome, Movement};
use crate::components::{forward, AnimatId};

/// Turns cost `turn_cost` health. A forward step costs `move_cost` health
/// when it succeeds; a blocked step costs the same only when
/// `charge_blocked_move` is set.
pub fn apply_movement(
    ctx: &mut ActionContext<'_>,
    actor: AnimatId,
    movement: Movement,
    outcome: &mut ActionOutcome,
) {
    let config = ctx.config;
    let costs = &config.costs;
    let Some(animat) = ctx.population.get_mut(actor) else {
        return;
    };

    match movement {
        Movement::Stay => {}
        Movement::TurnLeft | Movement::TurnRight => {
            animat.facing = if movement == Movement::TurnLeft {
                animat.facing.turn_left()
            } else {
                animat.facing.turn_right()
            };
            animat.lose_health(costs.turn_cost);
            let facing = animat.facing.name().to_string();
            ctx.emit(EventKind::Turned {
                animat: actor.0,
                facing,
            });
        }
        Movement::Forward => {
            let from = outcome.position;
            let to = forward(from, animat.facing, ctx.grid.size());
            match ctx.grid.move_animat(from, to) {
                Ok(()) => {
                    animat.lose_health(costs.move_cost);
                    outcome.position = to;
                    outcome.moved = true;
                    ctx.emit(EventKind::Moved {
                        animat: actor.0,
                        from: from.into(),
                        to: to.into(),
                    });
                }
                Err(_) => {
                    if costs.charge_blocked_move {
                        animat.lose_health(costs.move_cost);
                    }
                    outcome.blocked = true;
                    debug!("{} blocked at {} facing {}", actor, from, animat.facing);
                    ctx.emit(EventKind::Blocked {
                        animat: actor.0,
                        at: to.into(),
                    });
                }
            }
        }
    }
}
