//! Tick Scheduler
//!
//! One tick runs as a chain of systems over world resources:
//! collect the active set, shuffle it, let each animat observe, decide,
//! act and get rewarded in turn, regrow food, then hand a frame to the
//! recorder. Animats born mid-tick are not in the collected set and wait
//! for the next tick.

use animat_events::{EventKind, SimEvent};
use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use super::perception::observe;
use super::reward::{fitness, RewardWindows};
use crate::actions::{apply_action, Action, ActionContext};
use crate::components::{AnimatId, Grid, IdAllocator, Population, Position, ReputationLedger};
use crate::config::SimConfig;
use crate::events::TickEvents;
use crate::output::FrameSink;
use crate::SimRng;

/// The state the tick state machine is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPhase {
    #[default]
    Idle,
    CollectActive,
    RandomizeOrder,
    Act,
    Regrow,
    Render,
}

#[derive(Resource, Debug, Default)]
pub struct TickState {
    pub current_tick: u64,
    pub phase: TickPhase,
    /// Animats that took a turn this tick
    pub processed: usize,
    /// Whether food regrew this tick
    pub regrew: bool,
}

/// Animats collected at tick start, in the order they will act
#[derive(Resource, Debug, Default)]
pub struct TurnOrder {
    pub entries: Vec<(AnimatId, Position)>,
}

/// Removes dead animats (when death is enabled) and snapshots the rest.
pub fn collect_active(
    config: Res<SimConfig>,
    mut state: ResMut<TickState>,
    mut grid: ResMut<Grid>,
    mut population: ResMut<Population>,
    mut ledger: ResMut<ReputationLedger>,
    mut rewards: ResMut<RewardWindows>,
    mut events: ResMut<TickEvents>,
    mut order: ResMut<TurnOrder>,
) {
    state.phase = TickPhase::CollectActive;
    state.processed = 0;
    state.regrew = false;
    let tick = state.current_tick;

    let occupied = grid.occupied();
    order.entries.clear();
    for (pos, id) in occupied {
        let alive = population.get(id).map(|a| a.is_alive());
        match alive {
            Some(false) if config.world.death_enabled => {
                grid.remove_animat(pos);
                population.remove(id);
                ledger.forget(id);
                rewards.forget(id);
                debug!("{} died at {}", id, pos);
                events.push(SimEvent::new(
                    tick,
                    EventKind::Died {
                        animat: id.0,
                        at: pos.into(),
                    },
                ));
            }
            Some(_) => order.entries.push((id, pos)),
            None => {
                warn!("cell {} holds unknown {}; clearing it", pos, id);
                grid.remove_animat(pos);
            }
        }
    }
}

/// Shuffles the collected set so turn order has no positional bias.
pub fn randomize_order(mut state: ResMut<TickState>, mut rng: ResMut<SimRng>, mut order: ResMut<TurnOrder>) {
    state.phase = TickPhase::RandomizeOrder;
    order.entries.shuffle(&mut rng.0);
}

/// Runs every collected animat's turn, strictly one after another.
pub fn run_turns(
    config: Res<SimConfig>,
    mut state: ResMut<TickState>,
    order: Res<TurnOrder>,
    mut grid: ResMut<Grid>,
    mut population: ResMut<Population>,
    mut ledger: ResMut<ReputationLedger>,
    mut rewards: ResMut<RewardWindows>,
    mut ids: ResMut<IdAllocator>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<TickEvents>,
) {
    state.phase = TickPhase::Act;
    let mut ctx = ActionContext {
        config: &*config,
        grid: &mut *grid,
        population: &mut *population,
        ledger: &mut *ledger,
        ids: &mut *ids,
        rng: &mut rng.0,
        tick: state.current_tick,
        events: &mut events.events,
    };

    let mut processed = 0;
    for &(id, pos) in &order.entries {
        if take_turn(&mut ctx, &mut rewards, id, pos) {
            processed += 1;
        }
    }
    state.processed = processed;
}

/// Observe, decide, act and reward for one animat.
///
/// Returns false when the animat is no longer where the snapshot put it,
/// or is dead with death enabled. A failing brain makes the animat stay.
pub fn take_turn(ctx: &mut ActionContext<'_>, rewards: &mut RewardWindows, id: AnimatId, pos: Position) -> bool {
    let config = ctx.config;
    if ctx.grid.occupant(pos) != Some(id) {
        return false;
    }
    let Some(animat) = ctx.population.get(id) else {
        return false;
    };
    if config.world.death_enabled && !animat.is_alive() {
        return false;
    }

    let observation = observe(pos, animat, ctx.grid, ctx.population, ctx.ledger, &config.perception);

    let decided = match ctx.population.get_mut(id) {
        Some(animat) => animat.brain.decide(&observation, &mut *ctx.rng),
        None => return false,
    };
    let action = match decided {
        Ok(decision) => decision.action,
        Err(e) => {
            warn!("{} brain failed to decide: {}", id, e);
            ctx.emit(EventKind::BrainFailure {
                animat: id.0,
                message: e.to_string(),
            });
            Action::stay()
        }
    };

    apply_action(ctx, id, pos, action);

    let Some(animat) = ctx.population.get_mut(id) else {
        return true;
    };
    rewards.push(id, fitness(animat, ctx.ledger, config.social.reputation_weight));
    let signal = rewards.current_signal(id);
    if let Err(e) = animat.brain.reward(signal) {
        warn!("{} brain rejected reward {}: {}", id, signal, e);
        ctx.events.push(SimEvent::new(
            ctx.tick,
            EventKind::BrainFailure {
                animat: id.0,
                message: e.to_string(),
            },
        ));
    }
    true
}

/// Grid-wide food growth, gated to every `regrowth_interval` ticks.
pub fn regrow_food(
    config: Res<SimConfig>,
    mut state: ResMut<TickState>,
    mut grid: ResMut<Grid>,
    mut rng: ResMut<SimRng>,
) {
    state.phase = TickPhase::Regrow;
    state.regrew = grid.regrow(state.current_tick, config.resources.regrowth_interval, &mut rng.0);
}

/// Hands the finished tick's frame to the recorder.
pub fn capture_frame(
    mut state: ResMut<TickState>,
    grid: Res<Grid>,
    population: Res<Population>,
    mut sink: ResMut<FrameSink>,
    mut events: ResMut<TickEvents>,
) {
    state.phase = TickPhase::Render;
    let tick = state.current_tick;
    if let Err(e) = sink.record_from(tick, &grid, &population) {
        warn!("frame recorder failed at tick {}: {}", tick, e);
        events.push(SimEvent::new(
            tick,
            EventKind::RecorderFailure {
                message: e.to_string(),
            },
        ));
    }
}

/// The per-tick schedule, single-threaded and strictly ordered.
pub fn build_tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            collect_active,
            randomize_order,
            run_turns,
            regrow_food,
            capture_frame,
        )
            .chain(),
    );
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Movement;
    use crate::brain::{Brain, Decision, Offspring, ScriptedBrain};
    use crate::components::{Animat, Direction, GroupMarker};
    use crate::error::BrainError;
    use crate::systems::Observation;
    use rand::rngs::SmallRng;
    use rand::{RngCore, SeedableRng};
    use std::any::Any;

    fn world(size: usize, config: SimConfig) -> World {
        let mut world = World::new();
        world.insert_resource(Grid::new(size, config.resources.max_food).unwrap());
        world.insert_resource(RewardWindows::new(config.learning.reward_window));
        world.insert_resource(config);
        world.insert_resource(Population::new());
        world.insert_resource(ReputationLedger::new());
        world.insert_resource(IdAllocator::new());
        world.insert_resource(SimRng(SmallRng::seed_from_u64(5)));
        world.insert_resource(TickState::default());
        world.insert_resource(TurnOrder::default());
        world.insert_resource(TickEvents::new());
        world.insert_resource(FrameSink::null());
        world
    }

    fn spawn(world: &mut World, pos: Position, brain: Box<dyn Brain>) -> AnimatId {
        let id = world.resource_mut::<IdAllocator>().next_id();
        world.resource_mut::<Grid>().place_animat(pos, id).unwrap();
        world
            .resource_mut::<Population>()
            .insert(Animat::new(id, GroupMarker(0), Direction::Right, 20, 20, brain));
        id
    }

    #[derive(Debug, Clone)]
    struct BrokenBrain;

    impl Brain for BrokenBrain {
        fn kind(&self) -> &'static str {
            "broken"
        }
        fn decide(&mut self, _: &Observation, _: &mut dyn RngCore) -> Result<Decision, BrainError> {
            Err(BrainError::new("no weights"))
        }
        fn reward(&mut self, _: f64) -> Result<(), BrainError> {
            Ok(())
        }
        fn combine(&self, _: &dyn Brain, _: &mut dyn RngCore) -> Offspring {
            Offspring {
                brain: Box::new(self.clone()),
                marker_hint: None,
            }
        }
        fn clone_box(&self) -> Box<dyn Brain> {
            Box::new(self.clone())
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_dead_animats_removed_only_with_death_enabled() {
        let mut config = SimConfig::default();
        config.world.death_enabled = true;
        let mut world = world(4, config);
        let dead = spawn(&mut world, Position::new(0, 0), Box::new(ScriptedBrain::stay()));
        let alive = spawn(&mut world, Position::new(2, 2), Box::new(ScriptedBrain::stay()));
        world.resource_mut::<Population>().get_mut(dead).unwrap().health = 0;
        world.resource_mut::<ReputationLedger>().set_sentiment(dead, GroupMarker(1), 2.0);
        world.resource_mut::<RewardWindows>().push(dead, 1.0);

        let mut schedule = build_tick_schedule();
        schedule.run(&mut world);

        assert!(!world.resource::<Population>().contains(dead));
        assert_eq!(world.resource::<Grid>().occupant(Position::new(0, 0)), None);
        assert_eq!(world.resource::<ReputationLedger>().observer_count(), 0);
        assert!(world.resource::<RewardWindows>().get(dead).is_none());
        assert_eq!(world.resource::<TickState>().processed, 1);
        assert!(world.resource::<Population>().contains(alive));
        assert!(world
            .resource::<TickEvents>()
            .events
            .iter()
            .any(|e| matches!(e.kind, EventKind::Died { animat, .. } if animat == dead.0)));
    }

    #[test]
    fn test_zero_health_animats_keep_acting_without_death() {
        let mut world = world(4, SimConfig::default());
        let id = spawn(&mut world, Position::new(1, 1), Box::new(ScriptedBrain::stay()));
        world.resource_mut::<Population>().get_mut(id).unwrap().health = 0;

        build_tick_schedule().run(&mut world);

        assert!(world.resource::<Population>().contains(id));
        assert_eq!(world.resource::<TickState>().processed, 1);
        assert_eq!(world.resource::<TickState>().phase, TickPhase::Render);
    }

    #[test]
    fn test_brain_failure_defaults_to_stay() {
        let mut world = world(4, SimConfig::default());
        let start = Position::new(1, 1);
        let id = spawn(&mut world, start, Box::new(BrokenBrain));

        build_tick_schedule().run(&mut world);

        assert_eq!(world.resource::<Grid>().occupant(start), Some(id));
        let events = &world.resource::<TickEvents>().events;
        assert!(events
            .iter()
            .any(|e| matches!(&e.kind, EventKind::BrainFailure { message, .. } if message.contains("no weights"))));
        assert_eq!(world.resource::<TickState>().processed, 1);
    }

    #[test]
    fn test_reward_follows_fitness() {
        let mut world = world(4, SimConfig::default());
        let brain = ScriptedBrain::constant(Action::moving(Movement::Stay));
        let id = spawn(&mut world, Position::new(3, 3), Box::new(brain));

        let mut schedule = build_tick_schedule();
        schedule.run(&mut world);
        schedule.run(&mut world);

        let population = world.resource::<Population>();
        let brain = population
            .get(id)
            .unwrap()
            .brain
            .as_any()
            .downcast_ref::<ScriptedBrain>()
            .unwrap();
        // window of 2: a constant fitness of 20 gives 20, then settles to 0
        assert_eq!(brain.rewards(), &[20.0, 0.0]);
    }
}
