use gym_rs::core::{ActionReward, Env};
use gym_rs::envs::classical_control::cartpole::{CartPoleEnv, CartPoleObservation};
use gym_rs::utils::renderer::RenderMode;
use strum::{EnumCount, FromRepr};

use crate::env::Environment;

fn obs2arr(observation: CartPoleObservation) -> [f32; 4] {
    let mut arr = [0.0; 4];
    for (a, x) in arr.iter_mut().zip(Vec::from(observation)) {
        *a = x as f32;
    }
    arr
}

/// Actions for the [`CartPole`] environment, representing applying a left or right force to the cart
#[derive(FromRepr, EnumCount, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CPAction {
    Left = 0,
    Right = 1,
}

impl From<usize> for CPAction {
    fn from(value: usize) -> Self {
        Self::from_repr(value).expect("CPAction::from is only called with valid values [0, 1]")
    }
}

impl From<CPAction> for usize {
    fn from(action: CPAction) -> Self {
        action as usize
    }
}

/// The classic CartPole reinforcement learning environment
///
/// This implementation is a thin wrapper around [gym_rs](https://github.com/MathisWellmann/gym-rs),
/// truncating episodes after `max_steps` steps like CartPole-v1 does, so the best achievable score is `max_steps`.
#[derive(Debug, Clone)]
pub struct CartPole {
    gym_env: CartPoleEnv,
    steps: usize,
    max_steps: usize,
}

impl CartPole {
    /// Length of the observation vector
    pub const STATE_DIMS: usize = 4;
    /// Number of discrete actions
    pub const N_ACTIONS: usize = CPAction::COUNT;

    pub fn new(render_mode: RenderMode, max_steps: usize) -> Self {
        Self {
            gym_env: CartPoleEnv::new(render_mode),
            steps: 0,
            max_steps,
        }
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new(RenderMode::None, 500)
    }
}

impl Environment for CartPole {
    type State = [f32; 4];
    type Action = CPAction;

    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32) {
        let ActionReward {
            observation,
            reward,
            done,
            ..
        } = self.gym_env.step(action as usize);
        self.steps += 1;

        let next_state = if done || self.steps >= self.max_steps {
            None
        } else {
            Some(obs2arr(observation))
        };

        (next_state, *reward as f32)
    }

    fn reset(&mut self) -> Self::State {
        self.steps = 0;
        obs2arr(self.gym_env.reset(None, false, None).0)
    }
}
