/// Implemented RL algorithms
pub mod algo;

/// Environment
pub mod env;

/// Error type
pub mod error;

/// Trajectory buffering
pub mod memory;

/// Probability distributions over actions
pub mod prob;

/// Conversions into burn tensors
pub mod traits;

/// Testing environments
#[cfg(feature = "gym")]
pub mod gym;

/// Training dashboard
#[cfg(feature = "viz")]
pub mod viz;

mod util;

pub use error::A3CError;
