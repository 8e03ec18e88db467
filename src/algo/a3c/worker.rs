use std::sync::mpsc::Sender;

use burn::{
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use log::{debug, info};

use crate::{env::Environment, error::A3CError, traits::ToTensor};

use super::{
    agent::A3CAgent,
    counter::EpisodeCounter,
    model::ActorCriticModel,
    report::EpisodeReport,
    shared::{SharedModel, SharedOptimizer},
};

/// Name of the worker with index `id`, e.g. `w03`
pub fn worker_name(id: usize) -> String {
    format!("w{id:02}")
}

/// Borrowed handles to the state every worker shares
pub struct Shared<'a, B, M, O> {
    pub model: &'a SharedModel<M>,
    pub optimizer: &'a SharedOptimizer<B, M, O>,
    pub counter: &'a EpisodeCounter,
}

impl<B, M, O> Clone for Shared<'_, B, M, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B, M, O> Copy for Shared<'_, B, M, O> {}

/// What a worker did over the whole training run
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerStats {
    pub name: String,
    /// Episodes this worker finished
    pub episodes: usize,
    /// Synchronization points reached
    pub syncs: usize,
    /// Synchronization points whose optimizer step found gradients to apply
    pub applied_steps: usize,
    /// Score of each finished episode, in the order this worker played them
    pub rewards: Vec<f32>,
}

/// One independent learner: owns an environment and a local [`A3CAgent`], and repeatedly
/// pushes local gradients to and pulls parameters from the shared model
///
/// The worker keeps starting episodes while the shared episode counter is below `n_games`. A sync
/// happens every `t_max` steps, counted across episode boundaries, and whenever an episode ends.
pub struct Worker<'a, B, M, O, E>
where
    B: AutodiffBackend,
    E: Environment,
{
    id: usize,
    name: String,
    env: E,
    agent: A3CAgent<B, M, E>,
    shared: Shared<'a, B, M, O>,
    reports: Sender<EpisodeReport>,
    n_games: usize,
    t_max: usize,
    t_step: usize,
    stats: WorkerStats,
}

impl<'a, B, M, O, E> Worker<'a, B, M, O, E>
where
    B: AutodiffBackend,
    M: ActorCriticModel<B>,
    O: Optimizer<M, B>,
    E: Environment,
    Vec<E::State>: ToTensor<B, 2, Float>,
{
    /// Initialize a worker whose local model starts as a fork of the shared model
    ///
    /// ### Arguments
    /// - `id` Index of the worker, used in its name and reports
    /// - `env` The worker's own environment
    /// - `shared` Shared model, optimizer and episode counter
    /// - `reports` Channel receiving an [`EpisodeReport`] per finished episode
    /// - `gamma`, `n_games`, `t_max` Hyperparameters, see [`A3CConfig`](super::A3CConfig)
    /// - `device` The device of the local model
    ///
    /// ### Panics
    /// If `t_max` is zero
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        env: E,
        shared: Shared<'a, B, M, O>,
        reports: Sender<EpisodeReport>,
        gamma: f32,
        n_games: usize,
        t_max: usize,
        device: B::Device,
    ) -> Result<Self, A3CError> {
        assert!(t_max > 0, "t_max must be positive, got {t_max}");
        let name = worker_name(id);
        let model = shared.model.snapshot()?.fork(&device);
        Ok(Self {
            id,
            name: name.clone(),
            env,
            agent: A3CAgent::new(model, gamma, t_max, device),
            shared,
            reports,
            n_games,
            t_max,
            t_step: 1,
            stats: WorkerStats {
                name,
                episodes: 0,
                syncs: 0,
                applied_steps: 0,
                rewards: Vec::new(),
            },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Run episodes until the shared episode counter reaches `n_games`
    ///
    /// An episode already in progress when the limit is reached is played to the end and still counted.
    pub fn run(&mut self) -> Result<WorkerStats, A3CError> {
        while self.shared.counter.get() < self.n_games {
            let score = self.episode()?;

            let episode = self.shared.counter.increment();
            info!("worker: {} episode: {} reward: {}", self.name, episode, score);

            self.stats.episodes += 1;
            self.stats.rewards.push(score);
            let report = EpisodeReport {
                worker: self.id,
                episode,
                score,
            };
            if self.reports.send(report).is_err() {
                debug!("{}: report channel closed", self.name);
            }
        }

        debug!(
            "{} done after {} episodes and {} syncs",
            self.name, self.stats.episodes, self.stats.syncs
        );
        Ok(self.stats.clone())
    }

    /// Play one episode, synchronizing along the way
    ///
    /// **Returns** the episode's total reward
    fn episode(&mut self) -> Result<f32, A3CError> {
        let mut state = self.env.reset();
        let mut score = 0.0;
        self.agent.clear_memory();

        loop {
            let action = self.agent.choose_action(&state)?;
            let (next_state, reward) = self.env.step(action.clone());
            let done = next_state.is_none();
            score += reward;

            self.agent.remember(state, action, reward, next_state.clone());

            if self.t_step % self.t_max == 0 || done {
                self.sync(done)?;
            }
            self.t_step += 1;

            match next_state {
                Some(next) => state = next,
                None => return Ok(score),
            }
        }
    }

    /// Push the gradients of the local loss to the shared model, step the shared optimizer and
    /// pull the updated parameters back into the local model
    fn sync(&mut self, done: bool) -> Result<(), A3CError> {
        let loss = self.agent.calc_loss(done)?;
        let grads = loss.backward();
        let loss: f32 = loss.into_scalar().elem();
        if !loss.is_finite() {
            return Err(A3CError::NonFiniteLoss { loss });
        }

        let optimizer = self.shared.optimizer;
        optimizer.zero_grad();
        let grads = GradientsParams::from_grads(grads, self.agent.model());
        let clobbered = optimizer.set_grads(grads);
        let applied = optimizer.step(self.shared.model)?;

        let model = self.shared.model.snapshot()?.fork(self.agent.device());
        self.agent.set_model(model);
        self.agent.clear_memory();

        self.stats.syncs += 1;
        if applied {
            self.stats.applied_steps += 1;
        }
        debug!(
            "{} sync {}: loss {:.4}, clobbered {}, applied {}",
            self.name, self.stats.syncs, loss, clobbered, applied
        );

        Ok(())
    }
}
