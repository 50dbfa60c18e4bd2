use burn::{prelude::*, tensor::BasicOps};

/// An episodic environment with a discrete action space
///
/// Represents a Markov decision process in which an agent observes a state, picks one of
/// [`num_actions`](Environment::num_actions) actions, and receives a reward.
pub trait Environment {
    /// A raw observation of the environment, passed through a
    /// [`StateProcessor`](crate::processor::StateProcessor) before reaching the estimator
    type State: Clone;

    /// An action the agent can take, constructed from its index in `0..num_actions`
    type Action: From<usize>;

    /// The number of discrete actions; must be constant for the lifetime of the environment
    fn num_actions(&self) -> usize;

    /// Update the environment in response to an action taken by an agent
    ///
    /// **Returns** `(next_state, reward, done)`
    fn step(&mut self, action: Self::Action) -> (Self::State, f32, bool);

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;
}

/// A trait for converting items to tensors
///
/// Implemented for `Vec<T>` to convert batches of `T` into a tensor whose first dimension is the batch
pub trait ToTensor<B: Backend, const D: usize, K: BasicOps<B>> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D, K>;
}

impl<B: Backend> ToTensor<B, 1, Int> for Vec<usize> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 1, Int> {
        let len = self.len();
        let ints = self.into_iter().map(|a| a as i32).collect::<Vec<_>>();
        Tensor::from_ints(Data::new(ints, [len].into()), device)
    }
}

impl<B: Backend> ToTensor<B, 1, Float> for Vec<f32> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 1> {
        Tensor::from_floats(self.as_slice(), device)
    }
}

impl<B: Backend, const N: usize> ToTensor<B, 2, Float> for Vec<[f32; N]> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2> {
        let len = self.len();
        let flat = self.into_iter().flatten().collect::<Vec<_>>();
        Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([len, N])
    }
}

impl<B: Backend, const C: usize, const H: usize, const W: usize> ToTensor<B, 4, Float>
    for Vec<[[[f32; W]; H]; C]>
{
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 4> {
        let len = self.len();
        let flat = self
            .into_iter()
            .flatten()
            .flatten()
            .flatten()
            .collect::<Vec<_>>();
        Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([len, C, H, W])
    }
}
