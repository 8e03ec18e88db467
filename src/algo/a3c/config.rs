use burn::{optim::AdamConfig, prelude::*};

use crate::error::A3CError;

/// Hyperparameters of an [`A3C`](super::A3C) training run
#[derive(Config, Debug)]
pub struct A3CConfig {
    /// Total number of episodes, summed over all workers, after which workers stop starting new ones
    #[config(default = 4000)]
    pub n_games: usize,
    /// Maximum number of environment steps buffered between two synchronization points
    #[config(default = 5)]
    pub t_max: usize,
    /// The discount factor
    #[config(default = 0.99)]
    pub gamma: f32,
    /// The learning rate of the shared optimizer
    #[config(default = 1e-4)]
    pub lr: f64,
    #[config(default = 0.92)]
    pub beta_1: f32,
    #[config(default = 0.999)]
    pub beta_2: f32,
    #[config(default = 1e-8)]
    pub epsilon: f32,
    /// Number of worker threads, one per logical core if `None`
    pub workers: Option<usize>,
}

impl A3CConfig {
    /// Check the hyperparameters for values training cannot run with
    pub fn validate(&self) -> Result<(), A3CError> {
        if self.t_max == 0 {
            return Err(A3CError::InvalidConfig(String::from("`t_max` must be positive")));
        }
        if self.workers == Some(0) {
            return Err(A3CError::InvalidConfig(String::from(
                "at least one worker is required",
            )));
        }
        if !(0.0..1.0).contains(&self.gamma) {
            return Err(A3CError::InvalidConfig(format!(
                "`gamma` must be in [0, 1), got {}",
                self.gamma
            )));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(A3CError::InvalidConfig(format!(
                "`lr` must be positive, got {}",
                self.lr
            )));
        }
        Ok(())
    }

    /// Number of workers to spawn
    pub fn num_workers(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// The Adam configuration matching these hyperparameters, without weight decay
    pub fn optimizer(&self) -> AdamConfig {
        AdamConfig::new()
            .with_beta_1(self.beta_1)
            .with_beta_2(self.beta_2)
            .with_epsilon(self.epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = A3CConfig::new();
        assert_eq!(config.n_games, 4000);
        assert_eq!(config.t_max, 5);
        assert_eq!(config.gamma, 0.99);
        assert_eq!(config.lr, 1e-4);
        assert!(config.workers.is_none());
        assert!(config.num_workers() >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects() {
        assert!(A3CConfig::new().with_t_max(0).validate().is_err(), "zero horizon");
        assert!(A3CConfig::new().with_workers(Some(0)).validate().is_err(), "no workers");
        assert!(A3CConfig::new().with_gamma(1.0).validate().is_err(), "gamma of one");
        assert!(A3CConfig::new().with_gamma(-0.5).validate().is_err(), "negative gamma");
        assert!(A3CConfig::new().with_lr(0.0).validate().is_err(), "zero learning rate");
    }

    #[test]
    fn explicit_workers() {
        let config = A3CConfig::new().with_workers(Some(3));
        assert_eq!(config.num_workers(), 3);
    }
}
