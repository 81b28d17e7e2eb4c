//! Error taxonomy for the trigger pipeline.
//!
//! Lookup failures are raised where the lookup happens; the coordinator,
//! channel and effect executor catch them at their boundary and log.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TripwireError {
    #[error("could not find a scene with ID {0}")]
    SceneNotFound(String),

    #[error("could not find a zone with ID {zone} in scene {scene}")]
    ZoneNotFound { zone: String, scene: String },

    #[error("script {script} failed: {reason}")]
    Script { script: String, reason: String },

    #[error("transport error on {channel}: {reason}")]
    Transport { channel: String, reason: String },

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("host error: {0}")]
    Host(String),
}

pub type Result<T> = std::result::Result<T, TripwireError>;
