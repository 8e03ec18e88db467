use std::{
    any::Any,
    sync::mpsc::{self, Sender},
    thread,
};

use burn::{optim::Optimizer, prelude::*, tensor::backend::AutodiffBackend};
use log::{debug, info, warn};

use crate::{env::Environment, error::A3CError, traits::ToTensor};

use super::{
    config::A3CConfig,
    counter::EpisodeCounter,
    model::ActorCriticModel,
    report::{EpisodeReport, RewardLog},
    shared::{SharedModel, SharedOptimizer},
    worker::{worker_name, Shared, Worker, WorkerStats},
};

/// How a worker's run ended
#[derive(Debug)]
pub enum WorkerOutcome {
    /// The episode limit was reached
    Finished(WorkerStats),
    /// The worker stopped on an error
    Failed { name: String, error: A3CError },
    /// The worker's thread panicked, e.g. inside its environment
    Panicked { name: String, message: String },
}

impl WorkerOutcome {
    pub fn stats(&self) -> Option<&WorkerStats> {
        match self {
            Self::Finished(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

/// Result of [`A3C::train`]
#[derive(Debug)]
pub struct TrainingSummary {
    /// Every episode reported by every worker
    pub reward_log: RewardLog,
    /// One outcome per worker, in worker order
    pub outcomes: Vec<WorkerOutcome>,
}

impl TrainingSummary {
    /// Stats of the workers that finished normally
    pub fn finished(&self) -> impl Iterator<Item = &WorkerStats> {
        self.outcomes.iter().filter_map(WorkerOutcome::stats)
    }

    /// Number of workers that failed or panicked
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_finished()).count()
    }
}

/// Asynchronous advantage actor-critic
///
/// Holds the shared model, the shared optimizer and the shared episode counter, and trains them
/// with one worker thread per core. Workers push gradients and pull parameters without any
/// coordination beyond the per-operation locks of [`SharedModel`] and [`SharedOptimizer`].
///
/// ### Generics
/// - `B`: A burn autodiff backend
/// - `M`: The [`ActorCriticModel`] being trained
/// - `O`: The [`Optimizer`] shared by all workers
pub struct A3C<B, M, O>
where
    B: AutodiffBackend,
{
    model: SharedModel<M>,
    optimizer: SharedOptimizer<B, M, O>,
    counter: EpisodeCounter,
    config: A3CConfig,
    device: B::Device,
}

impl<B, M> A3C<B, M, ()>
where
    B: AutodiffBackend,
    M: ActorCriticModel<B>,
{
    /// Initialize with a shared Adam built from the `config` hyperparameters
    pub fn new(
        model: M,
        config: A3CConfig,
        device: B::Device,
    ) -> Result<A3C<B, M, impl Optimizer<M, B>>, A3CError> {
        let optimizer = SharedOptimizer::adam(&config.optimizer(), config.lr);
        A3C::with_optimizer(model, optimizer, config, device)
    }
}

impl<B, M, O> A3C<B, M, O>
where
    B: AutodiffBackend,
    M: ActorCriticModel<B>,
    O: Optimizer<M, B>,
{
    /// Initialize with any shared optimizer; `config.lr` and the Adam settings are then ignored
    pub fn with_optimizer(
        model: M,
        optimizer: SharedOptimizer<B, M, O>,
        config: A3CConfig,
        device: B::Device,
    ) -> Result<Self, A3CError> {
        config.validate()?;
        Ok(Self {
            model: SharedModel::new(model),
            optimizer,
            counter: EpisodeCounter::default(),
            config,
            device,
        })
    }

    pub fn config(&self) -> &A3CConfig {
        &self.config
    }

    /// Copy of the shared model's current parameters
    pub fn model(&self) -> Result<M, A3CError> {
        self.model.snapshot()
    }

    pub fn into_model(self) -> Result<M, A3CError> {
        self.model.into_inner()
    }

    /// Number of episodes finished so far, over all workers
    pub fn episodes(&self) -> usize {
        self.counter.get()
    }

    /// Number of updates the shared optimizer has applied
    pub fn optimizer_steps(&self) -> usize {
        self.optimizer.steps()
    }
}

impl<B, M, O> A3C<B, M, O>
where
    B: AutodiffBackend,
    M: ActorCriticModel<B> + Send,
    O: Optimizer<M, B> + Send,
{
    /// Spawn the workers, wait for all of them to finish, and collect their episode reports
    ///
    /// `make_env` is called once inside each worker thread with the worker's index. A worker that
    /// fails or panics stops on its own; the others carry on.
    pub fn train<E, F>(&self, make_env: F) -> Result<TrainingSummary, A3CError>
    where
        E: Environment,
        F: Fn(usize) -> E + Sync,
        Vec<E::State>: ToTensor<B, 2, Float>,
    {
        self.run(make_env, None)
    }

    /// Like [`train`](Self::train), additionally forwarding every report to `monitor` as it arrives
    pub fn train_with_monitor<E, F>(
        &self,
        make_env: F,
        monitor: Sender<EpisodeReport>,
    ) -> Result<TrainingSummary, A3CError>
    where
        E: Environment,
        F: Fn(usize) -> E + Sync,
        Vec<E::State>: ToTensor<B, 2, Float>,
    {
        self.run(make_env, Some(monitor))
    }

    fn run<E, F>(
        &self,
        make_env: F,
        monitor: Option<Sender<EpisodeReport>>,
    ) -> Result<TrainingSummary, A3CError>
    where
        E: Environment,
        F: Fn(usize) -> E + Sync,
        Vec<E::State>: ToTensor<B, 2, Float>,
    {
        let n_workers = self.config.num_workers();
        info!("number of cores: {}", num_cpus::get());
        info!("starting {n_workers} workers for {} games", self.config.n_games);

        let shared = Shared {
            model: &self.model,
            optimizer: &self.optimizer,
            counter: &self.counter,
        };
        let make_env = &make_env;
        let (tx, rx) = mpsc::channel();

        thread::scope(|s| {
            let mut handles = Vec::with_capacity(n_workers);
            for id in 0..n_workers {
                let name = worker_name(id);
                let tx = tx.clone();
                let handle = thread::Builder::new()
                    .name(name.clone())
                    .spawn_scoped(s, move || {
                        Worker::new(
                            id,
                            make_env(id),
                            shared,
                            tx,
                            self.config.gamma,
                            self.config.n_games,
                            self.config.t_max,
                            self.device.clone(),
                        )?
                        .run()
                    })
                    .map_err(|source| A3CError::Spawn {
                        name: name.clone(),
                        source,
                    })?;
                handles.push((name, handle));
            }
            drop(tx);

            let mut reward_log = RewardLog::new();
            for report in rx {
                if let Some(monitor) = &monitor {
                    if monitor.send(report.clone()).is_err() {
                        debug!("monitor disconnected, dropping report {report:?}");
                    }
                }
                reward_log.record(report);
            }

            let outcomes = handles
                .into_iter()
                .map(|(name, handle)| match handle.join() {
                    Ok(Ok(stats)) => WorkerOutcome::Finished(stats),
                    Ok(Err(error)) => {
                        warn!("worker {name} failed: {error}");
                        WorkerOutcome::Failed { name, error }
                    }
                    Err(payload) => {
                        let message = panic_message(payload);
                        warn!("worker {name} panicked: {message}");
                        WorkerOutcome::Panicked { name, message }
                    }
                })
                .collect();

            info!(
                "training finished after {} episodes and {} optimizer steps",
                self.counter.get(),
                self.optimizer.steps()
            );

            Ok(TrainingSummary {
                reward_log,
                outcomes,
            })
        })
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        String::from(*s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic payload")
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::{Autodiff, NdArray};

    use super::*;
    use crate::{
        algo::a3c::model::{ActorCritic, ActorCriticConfig},
        env::tests::MockEnv,
    };

    type B = Autodiff<NdArray>;

    type Model = ActorCritic<B>;

    fn a3c(workers: usize, n_games: usize) -> A3C<B, Model, impl Optimizer<Model, B>> {
        let device = Default::default();
        let model = ActorCriticConfig::new(4, 2).init::<B>(&device);
        let config = A3CConfig::new()
            .with_n_games(n_games)
            .with_workers(Some(workers));
        A3C::new(model, config, device).unwrap()
    }

    /// Environment that panics on its first step when `fail` is set
    struct FlakyEnv {
        inner: MockEnv,
        fail: bool,
    }

    impl Environment for FlakyEnv {
        type State = [f32; 4];
        type Action = usize;

        fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32) {
            assert!(!self.fail, "environment crashed");
            self.inner.step(action)
        }

        fn reset(&mut self) -> Self::State {
            self.inner.reset()
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let device = Default::default();
        let model = ActorCriticConfig::new(4, 2).init::<B>(&device);
        let config = A3CConfig::new().with_t_max(0);
        assert!(matches!(
            A3C::new(model, config, device),
            Err(A3CError::InvalidConfig(_))
        ));
    }

    #[test]
    fn workers_share_the_episode_budget() {
        let a3c = a3c(2, 6);
        let before = a3c.model().unwrap();

        let summary = a3c.train(|_| MockEnv::new(20)).unwrap();

        let episodes = a3c.episodes();
        assert!(
            (6..=7).contains(&episodes),
            "at most one overshoot per extra worker, got {episodes}"
        );
        assert_eq!(summary.failures(), 0);
        assert_eq!(summary.outcomes.len(), 2);
        assert_eq!(summary.reward_log.len(), episodes, "every episode was reported");
        assert_eq!(
            summary.finished().map(|s| s.episodes).sum::<usize>(),
            episodes
        );

        let mut counted = summary
            .reward_log
            .history()
            .iter()
            .map(|r| r.episode)
            .collect::<Vec<_>>();
        counted.sort_unstable();
        assert_eq!(
            counted,
            (1..=episodes).collect::<Vec<_>>(),
            "episode numbers are unique"
        );
        assert!(summary.reward_log.history().iter().all(|r| r.score == 20.0));

        for (worker, stats) in summary.finished().enumerate() {
            assert_eq!(summary.reward_log.worker(worker), stats.rewards.as_slice());
        }

        assert!(a3c.optimizer_steps() > 0);
        let input = || Tensor::<B, 2>::ones([1, 4], &Default::default());
        let (before, _) = before.forward(input());
        let (after, _) = a3c.model().unwrap().forward(input());
        assert_ne!(
            before.into_data().convert::<f32>().value,
            after.into_data().convert::<f32>().value,
            "shared parameters were trained"
        );
    }

    #[test]
    fn monitor_receives_every_report() {
        let a3c = a3c(2, 4);
        let (tx, rx) = mpsc::channel();

        let summary = a3c.train_with_monitor(|_| MockEnv::new(5), tx).unwrap();

        let forwarded = rx.iter().collect::<Vec<_>>();
        assert_eq!(forwarded, summary.reward_log.history());
    }

    #[test]
    fn panicking_worker_does_not_stop_the_others() {
        let a3c = a3c(2, 3);

        let summary = a3c
            .train(|id| FlakyEnv {
                inner: MockEnv::new(10),
                fail: id == 0,
            })
            .unwrap();

        match &summary.outcomes[0] {
            WorkerOutcome::Panicked { name, message } => {
                assert_eq!(name, "w00");
                assert!(message.contains("environment crashed"), "got {message}");
            }
            other => panic!("expected a panicked worker, got {other:?}"),
        }
        let stats = summary.outcomes[1].stats().expect("second worker finished");
        assert_eq!(stats.episodes, 3, "the healthy worker plays the whole budget");
        assert_eq!(a3c.episodes(), 3);
        assert_eq!(summary.failures(), 1);
    }
}
