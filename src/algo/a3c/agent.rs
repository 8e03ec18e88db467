use burn::{
    prelude::*,
    tensor::{activation::log_softmax, backend::AutodiffBackend, ElementConversion},
};
use rand::{distributions::Distribution, thread_rng};

use crate::{
    assert_interval,
    env::Environment,
    error::A3CError,
    memory::Trajectory,
    prob::Categorical,
    traits::ToTensor,
};

use super::{model::ActorCriticModel, returns::discounted_returns};

/// A worker's local actor-critic: its own copy of the model plus the trajectory segment
/// accumulated since the last synchronization point
///
/// ### Generics
/// - `B`: A burn autodiff backend
/// - `M`: The [`ActorCriticModel`]
/// - `E`: The [`Environment`] the agent acts in
pub struct A3CAgent<B, M, E>
where
    B: AutodiffBackend,
    E: Environment,
{
    model: M,
    memory: Trajectory<E>,
    gamma: f32,
    device: B::Device,
}

impl<B, M, E> A3CAgent<B, M, E>
where
    B: AutodiffBackend,
    M: ActorCriticModel<B>,
    E: Environment,
    Vec<E::State>: ToTensor<B, 2, Float>,
{
    /// Initialize a new `A3CAgent`
    ///
    /// ### Arguments
    /// - `model` The local copy of the [`ActorCriticModel`]
    /// - `gamma` The discount factor
    /// - `horizon` The expected maximum segment length, used to preallocate the trajectory
    /// - `device` The device the `model` lives on
    ///
    /// **Panics** if `gamma` is not in the interval `[0,1]`
    pub fn new(model: M, gamma: f32, horizon: usize, device: B::Device) -> Self {
        assert_interval!(gamma, 0.0, 1.0);
        Self {
            model,
            memory: Trajectory::with_capacity(horizon),
            gamma,
            device,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Replace the local model, e.g. with fresh parameters pulled from the shared model
    pub fn set_model(&mut self, model: M) {
        self.model = model;
    }

    pub fn memory(&self) -> &Trajectory<E> {
        &self.memory
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Sample an action from the policy's categorical distribution over actions in `state`
    pub fn choose_action(&self, state: &E::State) -> Result<E::Action, A3CError> {
        let input = vec![state.clone()].to_tensor(&self.device);
        let (logits, _) = self.model.forward(input);
        let dist = Categorical::from_tensor(logits.squeeze::<1>(0))?;
        Ok(E::Action::from(dist.sample(&mut thread_rng())))
    }

    /// Buffer a transition in the current segment
    pub fn remember(
        &mut self,
        state: E::State,
        action: E::Action,
        reward: f32,
        next_state: Option<E::State>,
    ) {
        self.memory.remember(state, action, reward, next_state);
    }

    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    /// Value estimate of a single state
    fn value(&self, state: &E::State) -> f32 {
        let input = vec![state.clone()].to_tensor(&self.device);
        let (_, value) = self.model.forward(input);
        value.into_scalar().elem()
    }

    /// Returns of the buffered segment, one per step in chronological order
    ///
    /// Bootstraps from zero if the episode is `done`, otherwise from the value of the last buffered next state.
    /// The returns carry no gradient.
    pub fn calc_r(&self, done: bool) -> Vec<f32> {
        let bootstrap = match self.memory.last_next_state() {
            Some(state) if !done => self.value(state),
            _ => 0.0,
        };
        discounted_returns(&self.memory.rewards, self.gamma, bootstrap)
    }

    /// Actor-critic loss over the buffered segment
    ///
    /// Mean over steps of the squared advantage (critic) plus the negative log-probability of
    /// the taken action weighted by the advantage (actor). The advantage is not detached, so the
    /// actor term also backpropagates into the value head.
    pub fn calc_loss(&self, done: bool) -> Result<Tensor<B, 1>, A3CError> {
        if self.memory.is_empty() {
            return Err(A3CError::EmptyTrajectory);
        }

        let len = self.memory.len();
        let returns = Tensor::<B, 1>::from_floats(
            Data::new(self.calc_r(done), [len].into()),
            &self.device,
        );
        let states = self.memory.states.clone().to_tensor(&self.device);
        let actions: Tensor<B, 1, Int> = self
            .memory
            .actions
            .iter()
            .cloned()
            .map(Into::into)
            .collect::<Vec<usize>>()
            .to_tensor(&self.device);

        let (logits, values) = self.model.forward(states);
        let advantage = returns - values.squeeze::<1>(1);

        let critic_loss = advantage.clone() * advantage.clone();

        let log_probs = log_softmax(logits, 1)
            .gather(1, actions.unsqueeze_dim(1))
            .squeeze::<1>(1);
        let actor_loss = log_probs.neg() * advantage;

        Ok((critic_loss + actor_loss).mean())
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
    type Agent = A3CAgent<B, ActorCritic<B>, MockEnv>;

    fn agent(gamma: f32) -> Agent {
        let device = Default::default();
        let model = ActorCriticConfig::new(4, 2).init::<B>(&device);
        A3CAgent::new(model, gamma, 5, device)
    }

    fn fill(agent: &mut Agent, rewards: &[f32], terminal: bool) {
        for (i, &r) in rewards.iter().enumerate() {
            let s = [i as f32 * 0.1; 4];
            let ns = [(i + 1) as f32 * 0.1; 4];
            let last = i + 1 == rewards.len();
            agent.remember(s, i % 2, r, (!(terminal && last)).then_some(ns));
        }
    }

    #[test]
    fn choose_action_in_range() {
        let agent = agent(0.99);
        for _ in 0..20 {
            let action = agent.choose_action(&[0.1, 0.2, 0.3, 0.4]).unwrap();
            assert!(action < 2, "action index within the action set");
        }
    }

    #[test]
    fn done_bootstraps_from_zero() {
        let mut agent = agent(0.99);
        fill(&mut agent, &[1.0; 5], false);

        let returns = agent.calc_r(true);
        let expected = discounted_returns(&[1.0; 5], 0.99, 0.0);
        assert_eq!(returns, expected, "value of the final next state is ignored when done");
    }

    #[test]
    fn truncated_segment_bootstraps_from_value() {
        let mut agent = agent(0.5);
        fill(&mut agent, &[1.0, 2.0], false);

        let bootstrap = agent.value(&[0.2; 4]);
        let returns = agent.calc_r(false);
        let expected = discounted_returns(&[1.0, 2.0], 0.5, bootstrap);
        for (r, e) in returns.iter().zip(&expected) {
            assert!((r - e).abs() < 1e-6);
        }
    }

    #[test]
    fn clear_memory_empties_segment() {
        let mut agent = agent(0.99);
        fill(&mut agent, &[1.0; 3], true);
        assert_eq!(agent.memory().len(), 3);

        agent.clear_memory();

        let memory = agent.memory();
        assert!(memory.states.is_empty());
        assert!(memory.actions.is_empty());
        assert!(memory.rewards.is_empty());
        assert!(memory.next_states.is_empty());
    }

    #[test]
    fn calc_loss_on_empty_segment() {
        let agent = agent(0.99);
        assert!(matches!(agent.calc_loss(true), Err(A3CError::EmptyTrajectory)));
    }

    #[test]
    fn calc_loss_matches_manual_computation() {
        let mut agent = agent(0.9);
        fill(&mut agent, &[1.0, 0.0, 2.0], true);

        let loss: f32 = agent.calc_loss(true).unwrap().into_scalar().elem();

        let returns = agent.calc_r(true);
        let mut expected = 0.0;
        for (i, state) in agent.memory().states.iter().enumerate() {
            let input = vec![*state].to_tensor(agent.device());
            let (logits, value) = agent.model().forward(input);
            let logits = logits.into_data().convert::<f32>().value;
            let value: f32 = value.into_scalar().elem();
            let dist = Categorical::from_logits(&logits).unwrap();
            let advantage = returns[i] - value;
            let log_prob = dist.log_prob(agent.memory().actions[i]);
            expected += advantage * advantage - log_prob * advantage;
        }
        expected /= 3.0;

        assert!((loss - expected).abs() < 1e-4, "expected {expected}, got {loss}");
    }

    #[test]
    fn calc_loss_reaches_both_heads() {
        let mut agent = agent(0.99);
        fill(&mut agent, &[1.0, 1.0], false);

        let loss = agent.calc_loss(false).unwrap();
        let grads = loss.backward();
        let model = agent.model();

        assert!(
            model.policy_l2.weight.val().grad(&grads).is_some(),
            "policy head has gradients"
        );
        assert!(
            model.value_l2.weight.val().grad(&grads).is_some(),
            "value head has gradients"
        );
    }

    #[test]
    #[should_panic(expected = "Invalid value for `gamma`")]
    fn rejects_invalid_gamma() {
        agent(1.5);
    }
}
