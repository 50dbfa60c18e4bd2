use std::vec;

use burn::{
    module::{Module, ModuleMapper, ModuleVisitor, ParamId},
    prelude::*,
};
use thiserror::Error;

use crate::assert_interval;

/// The source and target modules do not share an architecture
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("source module has {from} parameters but target module has {to}")]
    ParamCount { from: usize, to: usize },

    #[error("parameter {index} has shape {from:?} in the source module but {to:?} in the target module")]
    ParamShape {
        index: usize,
        from: Vec<usize>,
        to: Vec<usize>,
    },
}

/// Collects the shapes of every float parameter in visiting order
#[derive(Default)]
struct ShapeCollector {
    shapes: Vec<Vec<usize>>,
}

impl<B: Backend> ModuleVisitor<B> for ShapeCollector {
    fn visit_float<const D: usize>(&mut self, _id: &ParamId, tensor: &Tensor<B, D>) {
        self.shapes.push(tensor.dims().to_vec());
    }
}

/// Collects every float parameter, flattened, in visiting order
struct ParamCollector<B: Backend> {
    params: Vec<Tensor<B, 1>>,
}

impl<B: Backend> ModuleVisitor<B> for ParamCollector<B> {
    fn visit_float<const D: usize>(&mut self, _id: &ParamId, tensor: &Tensor<B, D>) {
        let numel = tensor.shape().num_elements();
        self.params.push(tensor.clone().reshape([numel]));
    }
}

/// Writes collected parameters into a module, blending with weight `tau`
struct ParamWriter<B: Backend> {
    params: vec::IntoIter<Tensor<B, 1>>,
    tau: f32,
}

impl<B: Backend> ModuleMapper<B> for ParamWriter<B> {
    fn map_float<const D: usize>(&mut self, _id: &ParamId, tensor: Tensor<B, D>) -> Tensor<B, D> {
        // Shapes and counts are validated before mapping
        let Some(source) = self.params.next() else {
            return tensor;
        };
        let require_grad = tensor.is_require_grad();
        let source = source
            .reshape(tensor.shape())
            .to_device(&tensor.device())
            .detach();

        let updated = if self.tau == 1.0 {
            source
        } else {
            source * self.tau + tensor.detach() * (1.0 - self.tau)
        };
        updated.set_require_grad(require_grad)
    }
}

/// Ordered parameter shapes of a module
pub fn param_shapes<B: Backend, M: Module<B>>(module: &M) -> Vec<Vec<usize>> {
    let mut collector = ShapeCollector::default();
    module.visit(&mut collector);
    collector.shapes
}

/// Check that both modules have the same number of parameters with pairwise equal shapes
///
/// Parameters are paired structurally: both modules are walked in field declaration order. Names
/// and ids play no part in the pairing.
pub fn check_compatible<B: Backend, M: Module<B>>(source: &M, target: &M) -> Result<(), SyncError> {
    let from = param_shapes(source);
    let to = param_shapes(target);

    if from.len() != to.len() {
        return Err(SyncError::ParamCount {
            from: from.len(),
            to: to.len(),
        });
    }

    match from.into_iter().zip(to).enumerate().find(|(_, (a, b))| a != b) {
        Some((index, (from, to))) => Err(SyncError::ParamShape { index, from, to }),
        None => Ok(()),
    }
}

/// Soft update the parameters of the target module
///
/// θ′ ← τθ + (1 − τ)θ′
///
/// ```ignore
/// target_net = soft_update(&policy_net, target_net, tau)?;
/// ```
///
/// **Panics** if `tau` is not in the interval `[0,1]`
pub fn soft_update<B: Backend, M: Module<B>>(source: &M, target: M, tau: f32) -> Result<M, SyncError> {
    assert_interval!(tau, 0.0, 1.0);
    check_compatible(source, &target)?;

    let mut collector = ParamCollector { params: Vec::new() };
    source.visit(&mut collector);

    let mut writer = ParamWriter {
        params: collector.params.into_iter(),
        tau,
    };
    Ok(target.map(&mut writer))
}

/// Copy every parameter of `source` into `target`, value for value
///
/// Parameters are paired in declaration order and nothing is written unless
/// [`check_compatible`] accepts both modules.
pub fn copy_params<B: Backend, M: Module<B>>(source: &M, target: M) -> Result<M, SyncError> {
    soft_update(source, target, 1.0)
}
