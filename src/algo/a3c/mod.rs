//! Asynchronous advantage actor-critic (A3C)
//!
//! Several [workers](Worker), each with its own environment and its own copy of an
//! [`ActorCriticModel`], train one [shared model](SharedModel) through one
//! [shared optimizer](SharedOptimizer). Every `t_max` steps, or when its episode ends, a worker
//! computes the loss of its buffered trajectory segment, overwrites the shared gradients with its own,
//! steps the shared optimizer and copies the updated parameters back. These synchronization points
//! are not ordered across workers, and a worker may apply gradients another worker wrote.
//!
//! ```ignore
//! let config = A3CConfig::new().with_n_games(4000);
//! let model = ActorCriticConfig::new(4, 2).init::<B>(&device);
//! let a3c = A3C::new(model, config, device)?;
//! let summary = a3c.train(|_| CartPole::default())?;
//! ```

mod agent;
mod config;
mod counter;
mod model;
mod orchestrator;
mod report;
mod returns;
mod shared;
mod worker;

pub use agent::A3CAgent;
pub use config::A3CConfig;
pub use counter::EpisodeCounter;
pub use model::{ActorCritic, ActorCriticConfig, ActorCriticModel};
pub use orchestrator::{TrainingSummary, WorkerOutcome, A3C};
pub use report::{EpisodeReport, RewardLog};
pub use returns::discounted_returns;
pub use shared::{SharedModel, SharedOptimizer};
pub use worker::{worker_name, Shared, Worker, WorkerStats};
