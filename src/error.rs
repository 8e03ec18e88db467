//! Error type
use std::io;

use rand::distributions::WeightedError;
use thiserror::Error;

/// Error raised while training with [`A3C`](crate::algo::a3c::A3C)
#[derive(Error, Debug)]
pub enum A3CError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("cannot compute a loss over an empty trajectory")]
    EmptyTrajectory,
    #[error("policy produced an invalid action distribution")]
    InvalidPolicy(#[from] WeightedError),
    #[error("loss became non-finite ({loss})")]
    NonFiniteLoss { loss: f32 },
    #[error("shared model is unavailable, a previous optimizer step panicked")]
    SharedModelUnavailable,
    #[error("failed to spawn worker {name}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
}
