use burn::{prelude::*, tensor::BasicOps};

/// A trait for converting items to tensors
///
/// Commonly implemented for `Vec<T>` to convert batches of `T` to a tensor of dimension `D`
pub trait ToTensor<B: Backend, const D: usize, K: BasicOps<B>> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D, K>;
}

/// A batch of fixed-length states becomes a `[batch, A]` float tensor
impl<B: Backend, const A: usize> ToTensor<B, 2, Float> for Vec<[f32; A]> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2> {
        let len = self.len();
        let data = Data::new(
            self.into_iter().flatten().collect::<Vec<_>>(),
            [len, A].into(),
        );
        Tensor::from_floats(data, device)
    }
}

/// A batch of dynamically sized states becomes a `[batch, width]` float tensor
///
/// **Panics** if the batch is empty or the rows differ in length
impl<B: Backend> ToTensor<B, 2, Float> for Vec<Vec<f32>> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2> {
        assert!(!self.is_empty(), "cannot infer the width of an empty batch");
        let len = self.len();
        let width = self[0].len();
        assert!(
            self.iter().all(|row| row.len() == width),
            "all states in a batch must have the same length"
        );
        let data = Data::new(self.concat(), [len, width].into());
        Tensor::from_floats(data, device)
    }
}

/// A batch of action indices becomes a `[batch]` int tensor
impl<B: Backend> ToTensor<B, 1, Int> for Vec<usize> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 1, Int> {
        let len = self.len();
        let data = Data::new(
            self.into_iter().map(|a| a as i32).collect::<Vec<_>>(),
            [len].into(),
        );
        Tensor::from_ints(data, device)
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    use super::*;

    #[test]
    fn array_batch_shape() {
        let batch = vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let tensor: Tensor<NdArray, 2> = batch.to_tensor(&Default::default());
        assert_eq!(tensor.dims(), [2, 3]);
        assert_eq!(
            tensor.into_data().convert::<f32>().value,
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn vec_batch_shape() {
        let batch = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let tensor: Tensor<NdArray, 2> = batch.to_tensor(&Default::default());
        assert_eq!(tensor.dims(), [3, 2]);
    }

    #[test]
    fn action_batch() {
        let tensor: Tensor<NdArray, 1, Int> = vec![0usize, 1, 1].to_tensor(&Default::default());
        assert_eq!(tensor.into_data().convert::<i64>().value, vec![0, 1, 1]);
    }
}
