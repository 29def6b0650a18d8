//! Error Types
//!
//! Library-level errors plus the failure types external collaborators
//! (decision modules, frame recorders) report back to the engine.

use thiserror::Error;

use crate::components::geometry::Position;

/// Errors raised by the simulation core.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid run parameters, detected before the simulation starts
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// Placement onto a cell that already holds an animat
    #[error("cell {0} is already occupied")]
    OccupancyConflict(Position),
    /// A bounded random search found no free cell
    #[error("no free cell found after {attempts} attempts")]
    RetryExhausted { attempts: u32 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Recorder(#[from] RecorderError),
}

impl SimError {
    pub fn config(message: impl Into<String>) -> Self {
        SimError::Configuration(message.into())
    }
}

/// Failure reported by a decision module.
#[derive(Debug, Clone, Error)]
#[error("brain failure: {0}")]
pub struct BrainError(pub String);

impl BrainError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Failure reported by a frame recorder.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("recorder IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("recorder encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("recorder unavailable: {0}")]
    Unavailable(String),
}

pub type SimResult<T> = Result<T, SimError>;
