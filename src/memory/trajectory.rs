use crate::env::Environment;

/// The unrolled segment of experience a worker accumulates between two synchronization points
///
/// Transitions are stored zipped into four parallel sequences which always have equal length.
/// No shape validation is performed on the states; that is the caller's responsibility.
pub struct Trajectory<E: Environment> {
    /// The state of the environment before taking the action
    pub states: Vec<E::State>,
    /// The action taken in the given state
    pub actions: Vec<E::Action>,
    /// The reward received after taking the action
    pub rewards: Vec<f32>,
    /// The state of the environment after the action is taken, or if terminal, `None`
    pub next_states: Vec<Option<E::State>>,
}

impl<E: Environment> Default for Trajectory<E> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<E: Environment> Trajectory<E> {
    /// Construct an empty `Trajectory` with room for `horizon` transitions
    pub fn with_capacity(horizon: usize) -> Self {
        Self {
            states: Vec::with_capacity(horizon),
            actions: Vec::with_capacity(horizon),
            rewards: Vec::with_capacity(horizon),
            next_states: Vec::with_capacity(horizon),
        }
    }

    /// Append a transition `(s, a, r, s')` to the segment
    pub fn remember(
        &mut self,
        state: E::State,
        action: E::Action,
        reward: f32,
        next_state: Option<E::State>,
    ) {
        self.states.push(state);
        self.actions.push(action);
        self.rewards.push(reward);
        self.next_states.push(next_state);
    }

    /// Empty all four sequences, keeping their allocations
    pub fn clear(&mut self) {
        self.states.clear();
        self.actions.clear();
        self.rewards.clear();
        self.next_states.clear();
    }

    /// Number of buffered transitions
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// The state observed after the most recent transition, if the segment is non-empty and it was not terminal
    pub fn last_next_state(&self) -> Option<&E::State> {
        self.next_states.last().and_then(Option::as_ref)
    }
}
