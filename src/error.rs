//! Error types for shoal.
//!
//! Only scene construction can fail. Once a [`Simulation`](crate::Simulation)
//! exists every tick produces a valid next state.

use std::fmt;

/// Errors raised while building a path, a config, or a simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A path needs at least one waypoint.
    EmptyPath,
    /// Arrival radius must be finite and positive.
    InvalidArrivalRadius(f32),
    /// A tunable is out of its valid range.
    InvalidConfig {
        field: &'static str,
        value: f32,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::EmptyPath => write!(f, "Path must contain at least one waypoint"),
            SimError::InvalidArrivalRadius(r) => {
                write!(f, "Arrival radius must be finite and positive, got {}", r)
            }
            SimError::InvalidConfig { field, value } => {
                write!(f, "Invalid value for `{}`: {}", field, value)
            }
        }
    }
}

impl std::error::Error for SimError {}
