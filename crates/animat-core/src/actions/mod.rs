//! Actions
//!
//! What an animat can do in one turn, and the applier that turns a
//! decision into grid, vitals and ledger changes.
//!
//! Rules run in a fixed order: move, eat, reset the target marker,
//! attack, mate. Later rules see the position the move produced.

pub mod conflict;
pub mod feeding;
pub mod mating;
pub mod movement;

use animat_events::{EventKind, SimEvent};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::components::{AnimatId, Grid, IdAllocator, Population, Position, ReputationLedger};
use crate::config::SimConfig;

/// Number of distinct choices encoded by [`Action::choice_index`].
pub const CHOICES: usize = 16;

/// Movement intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    #[default]
    Stay,
    TurnLeft,
    TurnRight,
    Forward,
}

impl Movement {
    pub const ALL: [Movement; 4] = [
        Movement::Stay,
        Movement::TurnLeft,
        Movement::TurnRight,
        Movement::Forward,
    ];

    pub fn index(self) -> usize {
        match self {
            Movement::Stay => 0,
            Movement::TurnLeft => 1,
            Movement::TurnRight => 2,
            Movement::Forward => 3,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }
}

/// A decision: one movement plus independent eat/attack/mate flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Action {
    pub movement: Movement,
    pub eat: bool,
    pub attack: bool,
    pub mate: bool,
}

impl Action {
    pub fn stay() -> Self {
        Self::default()
    }

    pub fn moving(movement: Movement) -> Self {
        Self {
            movement,
            ..Self::default()
        }
    }

    pub fn with_eat(mut self) -> Self {
        self.eat = true;
        self
    }

    pub fn with_attack(mut self) -> Self {
        self.attack = true;
        self
    }

    pub fn with_mate(mut self) -> Self {
        self.mate = true;
        self
    }

    /// Packs movement, attack and mate into `0..CHOICES`. Eating is not
    /// part of the choice.
    pub fn choice_index(&self) -> usize {
        self.movement.index() + 4 * usize::from(self.attack) + 8 * usize::from(self.mate)
    }

    /// Inverse of [`Action::choice_index`]; the result always eats.
    pub fn from_choice(choice: usize) -> Self {
        let choice = choice % CHOICES;
        Self {
            movement: Movement::from_index(choice % 4),
            eat: true,
            attack: choice & 4 != 0,
            mate: choice & 8 != 0,
        }
    }
}

/// Everything an action may read or mutate while one animat takes its turn
pub struct ActionContext<'a> {
    pub config: &'a SimConfig,
    pub grid: &'a mut Grid,
    pub population: &'a mut Population,
    pub ledger: &'a mut ReputationLedger,
    pub ids: &'a mut IdAllocator,
    pub rng: &'a mut dyn RngCore,
    pub tick: u64,
    pub events: &'a mut Vec<SimEvent>,
}

impl ActionContext<'_> {
    pub fn emit(&mut self, kind: EventKind) {
        self.events.push(SimEvent::new(self.tick, kind));
    }
}

/// What an applied action changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Where the actor stands after the action
    pub position: Position,
    pub moved: bool,
    pub blocked: bool,
    pub eaten: u32,
    pub attacked: Option<AnimatId>,
    pub offspring: Option<AnimatId>,
}

impl ActionOutcome {
    pub fn at(position: Position) -> Self {
        Self {
            position,
            moved: false,
            blocked: false,
            eaten: 0,
            attacked: None,
            offspring: None,
        }
    }
}

/// Applies `action` for the animat standing at `pos`.
pub fn apply_action(
    ctx: &mut ActionContext<'_>,
    actor: AnimatId,
    pos: Position,
    action: Action,
) -> ActionOutcome {
    let mut outcome = ActionOutcome::at(pos);
    if !ctx.population.contains(actor) {
        return outcome;
    }

    movement::apply_movement(ctx, actor, action.movement, &mut outcome);

    if action.eat {
        feeding::apply_eat(ctx, actor, &mut outcome);
    }

    if let Some(animat) = ctx.population.get_mut(actor) {
        animat.target = None;
    }

    if action.attack {
        conflict::apply_attack(ctx, actor, &mut outcome);
    }

    if action.mate {
        mating::apply_mate(ctx, actor, &mut outcome);
    }

    outcome
}
