/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an actor-critic worker can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent,
/// a fixed-length numeric state and a finite, discrete action space.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State: Clone;

    /// A discrete action index understood by the environment
    ///
    /// Actions are produced by sampling a categorical distribution, so they must be
    /// constructible from (and convertible back into) an index in `0..n_actions`.
    type Action: Clone + From<usize> + Into<usize>;

    /// Update the environment in response to an action taken by an agent, producing a new state and associated reward
    ///
    /// **Returns** `(next_state, reward)` where `next_state` is `None` once the episode is done
    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32);

    /// Reset the environment to an initial state, starting a new episode
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;
}
