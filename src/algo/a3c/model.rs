use burn::{
    module::AutodiffModule,
    prelude::*,
    tensor::{activation::relu, backend::AutodiffBackend},
};
use nn::{Linear, LinearConfig};

/// A burn module used as the policy and value approximator of an A3C worker
///
/// ### Generics
/// - `B`: A burn autodiff backend
pub trait ActorCriticModel<B: AutodiffBackend>: AutodiffModule<B> {
    /// Forward pass through the model
    ///
    /// Maps a `[batch, input]` tensor of states to `(policy_logits, values)` with shapes
    /// `[batch, n_actions]` and `[batch, 1]`
    fn forward(&self, input: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>);
}

/// Two independent two-layer heads sharing only their input: a policy head producing action logits
/// and a value head producing a state-value estimate
#[derive(Module, Debug)]
pub struct ActorCritic<B: Backend> {
    pub(crate) policy_l1: Linear<B>,
    pub(crate) policy_l2: Linear<B>,
    pub(crate) value_l1: Linear<B>,
    pub(crate) value_l2: Linear<B>,
}

#[derive(Config, Debug)]
pub struct ActorCriticConfig {
    /// Length of the state vector
    pub input_dims: usize,
    /// Size of the discrete action set
    pub n_actions: usize,
    /// Width of the hidden layer of each head
    #[config(default = 128)]
    pub hidden: usize,
}

impl ActorCriticConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ActorCritic<B> {
        ActorCritic {
            policy_l1: LinearConfig::new(self.input_dims, self.hidden).init(device),
            policy_l2: LinearConfig::new(self.hidden, self.n_actions).init(device),
            value_l1: LinearConfig::new(self.input_dims, self.hidden).init(device),
            value_l2: LinearConfig::new(self.hidden, 1).init(device),
        }
    }
}

impl<B: Backend> ActorCritic<B> {
    pub fn forward(&self, input: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let pi = relu(self.policy_l1.forward(input.clone()));
        let pi = self.policy_l2.forward(pi);

        let v = relu(self.value_l1.forward(input));
        let v = self.value_l2.forward(v);

        (pi, v)
    }
}

impl<B: AutodiffBackend> ActorCriticModel<B> for ActorCritic<B> {
    fn forward(&self, input: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        ActorCritic::forward(self, input)
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::{Autodiff, NdArray};

    use super::*;

    type TestBackend = Autodiff<NdArray>;

    #[test]
    fn forward_shapes() {
        let device = Default::default();
        let model = ActorCriticConfig::new(4, 2).init::<TestBackend>(&device);
        let input = Tensor::<TestBackend, 2>::zeros([3, 4], &device);

        let (pi, v) = ActorCriticModel::forward(&model, input);

        assert_eq!(pi.dims(), [3, 2], "one logit per action");
        assert_eq!(v.dims(), [3, 1], "one value per state");
    }

    #[test]
    fn config_defaults() {
        let config = ActorCriticConfig::new(8, 3);
        assert_eq!(config.hidden, 128);
        let model = config.with_hidden(16).init::<NdArray>(&Default::default());
        assert_eq!(model.policy_l1.weight.val().dims(), [8, 16]);
        assert_eq!(model.value_l2.weight.val().dims(), [16, 1]);
    }
}
