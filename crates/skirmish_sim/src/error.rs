//! # Simulation Error Types
//!
//! Gameplay never fails: invalid actions are ignored, not reported. What can
//! fail is startup (config, world generation) and the kill log file.

use skirmish_world::WorldError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while setting up or persisting the simulation.
#[derive(Error, Debug)]
pub enum SimError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        /// File that was requested.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`GameConfig`](crate::GameConfig).
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] toml::de::Error),

    /// The generated world failed its consistency check.
    #[error("world generation failed: {0}")]
    World(#[from] WorldError),

    /// The kill log could not be opened.
    #[error("kill log {path}: {source}")]
    KillLog {
        /// Log file path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// Result type for simulation setup.
pub type SimResult<T> = Result<T, SimError>;
