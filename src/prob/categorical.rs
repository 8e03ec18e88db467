use burn::{prelude::*, tensor::activation::softmax};
use rand::{
    distributions::{Distribution, WeightedError, WeightedIndex},
    Rng,
};

/// A categorical distribution over action indices, obtained from a policy's logits by the normalized exponential
///
/// Sampling returns an index in `0..n` where `n` is the number of logits.
#[derive(Debug, Clone)]
pub struct Categorical {
    probs: Vec<f32>,
    index: WeightedIndex<f32>,
}

impl Categorical {
    /// Construct from probabilities which are assumed to sum to one
    ///
    /// Fails if the weights are empty, negative, non-finite or all zero.
    pub fn from_probs(probs: Vec<f32>) -> Result<Self, WeightedError> {
        let index = WeightedIndex::new(&probs)?;
        Ok(Self { probs, index })
    }

    /// Construct from unnormalized logits
    pub fn from_logits(logits: &[f32]) -> Result<Self, WeightedError> {
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exponentials = logits.iter().map(|x| (x - max).exp()).collect::<Vec<_>>();
        let sum: f32 = exponentials.iter().sum();
        Self::from_probs(exponentials.into_iter().map(|x| x / sum).collect())
    }

    /// Construct from a 1-dimensional tensor of logits
    pub fn from_tensor<B: Backend>(logits: Tensor<B, 1>) -> Result<Self, WeightedError> {
        let probs = softmax(logits, 0).into_data().convert::<f32>().value;
        Self::from_probs(probs)
    }

    /// The probability of each action
    pub fn probs(&self) -> &[f32] {
        &self.probs
    }

    /// Log-probability of `action`, negative infinity if it is out of range
    pub fn log_prob(&self, action: usize) -> f32 {
        self.probs
            .get(action)
            .map_or(f32::NEG_INFINITY, |p| p.ln())
    }
}

impl Distribution<usize> for Categorical {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.index.sample(rng)
    }
}
