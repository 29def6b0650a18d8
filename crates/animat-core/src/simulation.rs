//! Simulation Driver
//!
//! Owns the ECS world and the tick schedule, advances ticks, forwards
//! events to the log and keeps the run summary.

use animat_events::{RunSummary, SimEvent};
use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::brain::{build_brain, Brain};
use crate::components::{
    Animat, AnimatId, Direction, Grid, GroupMarker, IdAllocator, Population, Position, ReputationLedger,
};
use crate::config::SimConfig;
use crate::error::SimError;
use crate::events::{EventLog, TickEvents};
use crate::output::{finalize_summary, tally_events, FrameRecorder, FrameSink, NullRecorder};
use crate::setup::{seed_food, spawn_initial_animats};
use crate::SimRng;
use crate::systems::{
    build_tick_schedule, fitness, RewardWindows, TickPhase, TickState, TurnOrder,
};

/// An animat placed explicitly by the caller
pub struct AnimatSpec {
    pub position: Position,
    pub facing: Direction,
    pub group: GroupMarker,
    pub brain: Option<Box<dyn Brain>>,
    pub health: Option<u32>,
    pub energy: Option<u32>,
}

impl AnimatSpec {
    pub fn new(position: Position, facing: Direction, group: u8) -> Self {
        Self {
            position,
            facing,
            group: GroupMarker(group),
            brain: None,
            health: None,
            energy: None,
        }
    }

    pub fn with_brain(mut self, brain: impl Brain + 'static) -> Self {
        self.brain = Some(Box::new(brain));
        self
    }

    pub fn with_vitals(mut self, health: u32, energy: u32) -> Self {
        self.health = Some(health);
        self.energy = Some(energy);
        self
    }
}

/// What one call to [`Simulation::step`] did
#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    /// Animats that took a turn
    pub processed: usize,
    pub events: Vec<SimEvent>,
    /// Population after the tick
    pub population: usize,
}

pub struct SimulationBuilder {
    config: SimConfig,
    recorder: Option<Box<dyn FrameRecorder>>,
    event_log: Option<EventLog>,
    brain_template: Option<Box<dyn Brain>>,
    animats: Vec<AnimatSpec>,
    food: Vec<(Position, u32)>,
    empty_board: bool,
}

impl SimulationBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            recorder: None,
            event_log: None,
            brain_template: None,
            animats: Vec::new(),
            food: Vec::new(),
            empty_board: false,
        }
    }

    pub fn with_recorder(mut self, recorder: impl FrameRecorder + 'static) -> Self {
        self.recorder = Some(Box::new(recorder));
        self
    }

    pub fn with_event_log(mut self, log: EventLog) -> Self {
        self.event_log = Some(log);
        self
    }

    /// Initial animats get clones of this brain instead of fresh ones.
    pub fn with_brain_template(mut self, brain: Box<dyn Brain>) -> Self {
        self.brain_template = Some(brain);
        self
    }

    pub fn with_animat(mut self, spec: AnimatSpec) -> Self {
        self.animats.push(spec);
        self
    }

    pub fn with_food(mut self, pos: Position, amount: u32) -> Self {
        self.food.push((pos, amount));
        self
    }

    /// Skip the food layout and the initial population; only explicit
    /// animats and food are placed.
    pub fn empty_board(mut self) -> Self {
        self.empty_board = true;
        self
    }

    pub fn build(self) -> Result<Simulation, SimError> {
        let config = self.config;
        config.validate()?;

        let mut rng = SmallRng::seed_from_u64(config.world.seed);
        let mut grid = Grid::new(config.world.board_size, config.resources.max_food)?;
        let mut population = Population::new();
        let mut ids = IdAllocator::new();

        let template = self.brain_template;
        let fresh_brain = |config: &SimConfig| -> Box<dyn Brain> {
            match &template {
                Some(brain) => brain.clone_box(),
                None => build_brain(config.learning.brain, &config.learning),
            }
        };

        if self.empty_board {
            let positions: Vec<Position> = grid.positions().collect();
            for pos in positions {
                grid.set_regrowth_rate(pos, config.resources.regrowth_rate);
            }
        } else {
            seed_food(&mut grid, &config.world, &config.resources, &mut rng);
            spawn_initial_animats(&config, &mut grid, &mut population, &mut ids, &mut rng, |_| {
                fresh_brain(&config)
            })?;
        }

        for spec in self.animats {
            let id = ids.next_id();
            grid.place_animat(spec.position, id)?;
            let brain = spec.brain.unwrap_or_else(|| fresh_brain(&config));
            population.insert(Animat::new(
                id,
                spec.group,
                spec.facing,
                spec.health.unwrap_or(config.resources.initial_health),
                spec.energy.unwrap_or(config.resources.initial_energy),
                brain,
            ));
        }
        for (pos, amount) in self.food {
            grid.set_food(pos, amount);
        }

        let sink = FrameSink::limited(
            self.recorder.unwrap_or_else(|| Box::new(NullRecorder)),
            config.world.ticks,
            config.recording.last_ticks,
        );

        info!(
            "simulation ready: {}x{} board, {} animats, seed {}",
            config.world.board_size,
            config.world.board_size,
            population.len(),
            config.world.seed
        );

        let mut world = World::new();
        world.insert_resource(RewardWindows::new(config.learning.reward_window));
        world.insert_resource(grid);
        world.insert_resource(population);
        world.insert_resource(ids);
        world.insert_resource(ReputationLedger::new());
        world.insert_resource(SimRng(rng));
        world.insert_resource(TickState::default());
        world.insert_resource(TurnOrder::default());
        world.insert_resource(TickEvents::new());
        world.insert_resource(sink);
        world.insert_resource(config);

        Ok(Simulation {
            world,
            schedule: build_tick_schedule(),
            event_log: self.event_log.unwrap_or_default(),
            summary: RunSummary::default(),
            ticks_run: 0,
        })
    }
}

pub struct Simulation {
    world: World,
    schedule: Schedule,
    event_log: EventLog,
    summary: RunSummary,
    ticks_run: u64,
}

impl Simulation {
    pub fn builder(config: SimConfig) -> SimulationBuilder {
        SimulationBuilder::new(config)
    }

    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        SimulationBuilder::new(config).build()
    }

    /// Runs one full tick.
    pub fn step(&mut self) -> TickReport {
        let tick = self.ticks_run;
        self.world.resource_mut::<TickState>().current_tick = tick;
        self.schedule.run(&mut self.world);

        let events = self.world.resource_mut::<TickEvents>().drain();
        if let Err(e) = self.event_log.log_batch(&events) {
            warn!("failed to write events for tick {}: {}", tick, e);
        }
        tally_events(&mut self.summary, &events);
        self.ticks_run += 1;

        TickReport {
            tick,
            processed: self.world.resource::<TickState>().processed,
            events,
            population: self.population().len(),
        }
    }

    /// Runs `ticks` ticks and returns their reports.
    pub fn run_for(&mut self, ticks: u64) -> Vec<TickReport> {
        (0..ticks).map(|_| self.step()).collect()
    }

    /// Runs the configured number of ticks, then finishes the run.
    pub fn run(&mut self) -> RunSummary {
        let ticks = self.config().world.ticks;
        for _ in 0..ticks {
            let report = self.step();
            if report.tick > 0 && report.tick % 100 == 0 {
                info!("tick {} / {}: {} animats", report.tick, ticks, report.population);
            }
        }
        self.finish()
    }

    /// Flushes recorder and log, and returns the summary so far.
    pub fn finish(&mut self) -> RunSummary {
        if let Err(e) = self.world.resource_mut::<FrameSink>().finish() {
            warn!("frame recorder failed to finish: {}", e);
        }
        if let Err(e) = self.event_log.flush() {
            warn!("failed to flush event log: {}", e);
        }
        let population = self.world.resource::<Population>();
        finalize_summary(&mut self.summary, self.ticks_run, population);
        info!(
            "run complete: {} ticks, {} animats, {} births, {} deaths",
            self.summary.ticks_run, self.summary.final_population, self.summary.births, self.summary.deaths
        );
        self.summary.clone()
    }

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    pub fn grid(&self) -> &Grid {
        self.world.resource::<Grid>()
    }

    pub fn population(&self) -> &Population {
        self.world.resource::<Population>()
    }

    pub fn animat(&self, id: AnimatId) -> Option<&Animat> {
        self.population().get(id)
    }

    pub fn position_of(&self, id: AnimatId) -> Option<Position> {
        self.grid().locate(id)
    }

    pub fn ledger(&self) -> &ReputationLedger {
        self.world.resource::<ReputationLedger>()
    }

    pub fn ledger_mut(&mut self) -> Mut<'_, ReputationLedger> {
        self.world.resource_mut::<ReputationLedger>()
    }

    pub fn rewards(&self) -> &RewardWindows {
        self.world.resource::<RewardWindows>()
    }

    /// Ticks completed so far.
    pub fn current_tick(&self) -> u64 {
        self.ticks_run
    }

    pub fn phase(&self) -> TickPhase {
        self.world.resource::<TickState>().phase
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn events_logged(&self) -> u64 {
        self.event_log.event_count()
    }

    /// Animat with the highest fitness, lowest id on ties.
    pub fn fittest(&self) -> Option<&Animat> {
        let weight = self.config().social.reputation_weight;
        let ledger = self.ledger();
        self.population()
            .iter()
            .map(|a| (a, fitness(a, ledger, weight)))
            .fold(None, |best: Option<(&Animat, f64)>, (a, f)| match best {
                Some((_, best_f)) if best_f >= f => best,
                _ => Some((a, f)),
            })
            .map(|(a, _)| a)
    }
}
