//! Error types for the loop, the simulation and configuration

use std::io;

use thiserror::Error;

/// Failure to start a [`crate::GameLoop`]
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("game loop is already running")]
    AlreadyStarted,
    #[error("game loop was stopped and cannot be restarted")]
    Stopped,
    #[error("failed to spawn loop thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Error raised by a single tick callback
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickError {
    /// The tick is abandoned; the activity continues at its next period
    #[error("tick failed: {0}")]
    Recoverable(String),
    /// The whole loop transitions to STOPPED
    #[error("unrecoverable tick failure: {0}")]
    Unrecoverable(String),
}

impl TickError {
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, TickError::Unrecoverable(_))
    }
}

/// Why a bomb could not be planted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlantError {
    #[error("a bomb is already planted on this cell")]
    CellOccupied,
    #[error("all bombs are already planted")]
    CapacityReached,
    #[error("dead entities cannot plant bombs")]
    Dead,
    #[error("only the hero carries a detonator")]
    NoDetonator,
}

/// Simulation invariant violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("tile grid is corrupt: expected {expected} tiles, found {found}")]
    CorruptGrid { expected: usize, found: usize },
}

impl From<SimError> for TickError {
    fn from(err: SimError) -> Self {
        TickError::Unrecoverable(err.to_string())
    }
}

/// Configuration loading and validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
