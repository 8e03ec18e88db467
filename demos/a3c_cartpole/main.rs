use a3c::{
    algo::a3c::{A3CConfig, ActorCriticConfig, A3C},
    gym::CartPole,
};
use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
use log::{info, warn};

type A3CBackend = Autodiff<NdArray>;

const N_GAMES: usize = 4000;
const T_MAX: usize = 5;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = A3CConfig::new()
        .with_n_games(N_GAMES)
        .with_t_max(T_MAX)
        .with_gamma(0.99)
        .with_lr(1e-4);

    #[cfg(feature = "viz")]
    a3c::viz::init_logger(log::LevelFilter::Info)?;
    #[cfg(not(feature = "viz"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let device = NdArrayDevice::Cpu;
    let model = ActorCriticConfig::new(CartPole::STATE_DIMS, CartPole::N_ACTIONS)
        .init::<A3CBackend>(&device);
    let workers = config.num_workers();
    let a3c = A3C::new(model, config, device)?;

    #[cfg(feature = "viz")]
    let summary = {
        let (handle, tx) = a3c::viz::init(workers, N_GAMES);
        let summary = a3c.train_with_monitor(|_| CartPole::default(), tx)?;
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("dashboard stopped with an error: {err}"),
            Err(_) => warn!("dashboard thread panicked"),
        }
        summary
    };
    #[cfg(not(feature = "viz"))]
    let summary = a3c.train(|_| CartPole::default())?;

    for outcome in &summary.outcomes {
        match outcome.stats() {
            Some(stats) => {
                let recent = &stats.rewards[stats.rewards.len().saturating_sub(100)..];
                let mean = recent.iter().sum::<f32>() / recent.len().max(1) as f32;
                info!(
                    "worker {}: {} episodes, mean reward of last {} = {:.1}",
                    stats.name,
                    stats.episodes,
                    recent.len(),
                    mean
                );
            }
            None => warn!("{outcome:?}"),
        }
    }
    if let Some(mean) = summary.reward_log.recent_mean(100) {
        info!(
            "{} episodes over {} workers, mean reward of last 100 = {:.1}",
            summary.reward_log.len(),
            workers,
            mean
        );
    }

    Ok(())
}
