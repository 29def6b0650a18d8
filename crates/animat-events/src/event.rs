//! Event Types
//!
//! Structured records of everything that happens to an animat during a
//! tick. One JSON object per line when logged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A board coordinate as it appears in logs and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: u32,
    pub y: u32,
}

impl GridPos {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Primary event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Movement,
    Feeding,
    Conflict,
    Birth,
    Death,
    Failure,
}

impl EventType {
    /// Returns all event type variants.
    pub fn all() -> &'static [EventType] {
        &[
            EventType::Movement,
            EventType::Feeding,
            EventType::Conflict,
            EventType::Birth,
            EventType::Death,
            EventType::Failure,
        ]
    }
}

/// What happened. Animats are referred to by their numeric identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Occupancy moved to the forward cell
    Moved { animat: u64, from: GridPos, to: GridPos },
    /// Facing changed in place
    Turned { animat: u64, facing: String },
    /// Forward cell was occupied; the move failed
    Blocked { animat: u64, at: GridPos },
    /// Food transferred from the current cell
    Ate { animat: u64, amount: u32, recovered: u32 },
    /// Damage dealt to the animat in front
    Attacked { attacker: u64, target: u64, damage: u32 },
    /// Attack preconditions failed against an existing target
    AttackRefused { attacker: u64, target: u64 },
    /// Offspring placed on the board
    Born {
        animat: u64,
        parents: [u64; 2],
        at: GridPos,
        group: u8,
    },
    /// Removed from the board with no health left
    Died { animat: u64, at: GridPos },
    /// Offspring placement gave up after bounded retries
    PlacementExhausted { animat: u64, attempts: u32 },
    /// The decision module failed; the animat stayed put
    BrainFailure { animat: u64, message: String },
    /// The frame recorder failed; the simulation continued
    RecorderFailure { message: String },
}

impl EventKind {
    /// Category of this event.
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::Moved { .. } | EventKind::Turned { .. } | EventKind::Blocked { .. } => {
                EventType::Movement
            }
            EventKind::Ate { .. } => EventType::Feeding,
            EventKind::Attacked { .. } | EventKind::AttackRefused { .. } => EventType::Conflict,
            EventKind::Born { .. } => EventType::Birth,
            EventKind::Died { .. } => EventType::Death,
            EventKind::PlacementExhausted { .. }
            | EventKind::BrainFailure { .. }
            | EventKind::RecorderFailure { .. } => EventType::Failure,
        }
    }

    /// The animat primarily responsible for this event, if any.
    pub fn actor(&self) -> Option<u64> {
        match self {
            EventKind::Moved { animat, .. }
            | EventKind::Turned { animat, .. }
            | EventKind::Blocked { animat, .. }
            | EventKind::Ate { animat, .. }
            | EventKind::Born { animat, .. }
            | EventKind::Died { animat, .. }
            | EventKind::PlacementExhausted { animat, .. }
            | EventKind::BrainFailure { animat, .. } => Some(*animat),
            EventKind::Attacked { attacker, .. } | EventKind::AttackRefused { attacker, .. } => {
                Some(*attacker)
            }
            EventKind::RecorderFailure { .. } => None,
        }
    }
}

/// A single logged event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub kind: EventKind,
}

impl SimEvent {
    pub fn new(tick: u64, kind: EventKind) -> Self {
        Self { tick, kind }
    }

    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// Serializes to a single JSON line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses one line produced by [`SimEvent::to_jsonl`].
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
