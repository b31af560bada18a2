//! Crate-level error type.

use thiserror::Error;

pub use crate::actuator::interface::ActuatorError;
pub use crate::config::ConfigError;
pub use crate::perception::PerceptionError;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("perception failure: {0}")]
    Perception(#[from] PerceptionError),

    #[error("actuator failure: {0}")]
    Actuator(#[from] ActuatorError),

    #[error("{name} loop failed: {source}")]
    LoopFailed {
        name: &'static str,
        #[source]
        source: Box<TrackerError>,
    },

    #[error("{name} loop exited before shutdown was requested")]
    LoopExitedEarly { name: &'static str },

    #[error("{name} loop panicked")]
    LoopPanicked { name: &'static str },

    #[error("failed to create metrics histogram: {0}")]
    Metrics(#[from] hdrhistogram::CreationError),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("signal listener error: {0}")]
    Signal(#[source] std::io::Error),
}
