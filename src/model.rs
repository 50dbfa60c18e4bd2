use burn::{
    module::AutodiffModule,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        Linear, LinearConfig, Relu,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};

/// A burn module that estimates one value per discrete action
///
/// ### Generics
/// - `B`: A burn backend
/// - `D`: The dimension of the input tensor, batch dimension first
pub trait QModel<B: AutodiffBackend, const D: usize>: AutodiffModule<B> {
    /// Forward pass through the model
    ///
    /// **Returns** a `[batch, num_actions]` tensor of action values
    fn forward(&self, input: Tensor<B, D>) -> Tensor<B, 2>;

    /// The number of actions the model produces values for
    fn num_actions(&self) -> usize;
}

/// Convolutional action-value network over small multi-channel grids
///
/// ```text
/// Input:   [batch, C, H, W]
/// Conv1:   C -> filters, 1x1 kernel, ReLU
/// Conv2:   filters -> filters, 1x1 kernel, ReLU
/// Flatten: filters * H * W
/// FC1:     -> hidden, ReLU
/// FC2:     hidden -> num_actions
/// ```
#[derive(Module, Debug)]
pub struct ConvQNetwork<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    fc1: Linear<B>,
    fc2: Linear<B>,
    relu: Relu,
    flattened: usize,
    num_actions: usize,
}

#[derive(Config, Debug)]
pub struct ConvQNetworkConfig {
    #[config(default = 1)]
    pub channels: usize,
    #[config(default = 3)]
    pub height: usize,
    #[config(default = 3)]
    pub width: usize,
    #[config(default = 9)]
    pub filters: usize,
    #[config(default = 9)]
    pub hidden: usize,
    #[config(default = 3)]
    pub num_actions: usize,
}

impl ConvQNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvQNetwork<B> {
        let flattened = self.filters * self.height * self.width;
        ConvQNetwork {
            conv1: Conv2dConfig::new([self.channels, self.filters], [1, 1]).init(device),
            conv2: Conv2dConfig::new([self.filters, self.filters], [1, 1]).init(device),
            fc1: LinearConfig::new(flattened, self.hidden).init(device),
            fc2: LinearConfig::new(self.hidden, self.num_actions).init(device),
            relu: Relu::new(),
            flattened,
            num_actions: self.num_actions,
        }
    }
}

impl<B: Backend> ConvQNetwork<B> {
    /// Forward pass: `[batch, C, H, W]` -> `[batch, num_actions]`
    pub fn values(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch_size, _, _, _] = input.dims();

        let x = self.relu.forward(self.conv1.forward(input));
        let x = self.relu.forward(self.conv2.forward(x));
        let x = x.reshape([batch_size, self.flattened]);
        let x = self.relu.forward(self.fc1.forward(x));
        self.fc2.forward(x)
    }
}

impl<B: AutodiffBackend> QModel<B, 4> for ConvQNetwork<B> {
    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        self.values(input)
    }

    fn num_actions(&self) -> usize {
        self.num_actions
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use burn::backend::{Autodiff, NdArray};

    use super::*;

    pub type TestBackend = Autodiff<NdArray>;

    #[test]
    fn network_output_shape() {
        let device = Default::default();
        let network = ConvQNetworkConfig::new().init::<TestBackend>(&device);

        let input = Tensor::zeros([5, 1, 3, 3], &device);
        let output = network.forward(input);
        assert_eq!(output.dims(), [5, 3]);
        assert_eq!(QModel::<TestBackend, 4>::num_actions(&network), 3);
    }

    #[test]
    fn network_custom_shape() {
        let device = Default::default();
        let network = ConvQNetworkConfig::new()
            .with_channels(3)
            .with_height(4)
            .with_width(2)
            .with_num_actions(6)
            .init::<TestBackend>(&device);

        let output = network.values(Tensor::ones([2, 3, 4, 2], &device));
        assert_eq!(output.dims(), [2, 6]);
    }

    #[test]
    fn network_is_deterministic() {
        let device = Default::default();
        let network = ConvQNetworkConfig::new().init::<TestBackend>(&device);
        let input = Tensor::<TestBackend, 4>::ones([1, 1, 3, 3], &device);

        let a = network.values(input.clone()).into_data().value;
        let b = network.values(input).into_data().value;
        assert_eq!(a, b, "predict has no side effects");
    }
}
