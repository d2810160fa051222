//! Error types
//!
//! Nothing in the simulation is fatal. These cover the two places where a caller
//! can hand the core something it cannot use: an unknown scene name and a bad
//! tuning file.

use thiserror::Error;

/// Run-lifecycle host failures. The current scene is left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    /// A scene name that was never registered
    #[error("scene '{0}' not found")]
    UnknownScene(String),
    /// `pop_state` with nothing suspended underneath
    #[error("no suspended scene to return to")]
    EmptyStack,
}

/// Failures while loading a tuning table
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(&'static str),
}
